use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{DownloadTarget, ABS_DATAFLOW_KEYWORDS};
use crate::config::Config;
use crate::fetch_error::DownloadError;

const API_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// What happened to one download target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File was already present and `force` was not set
    Skipped(PathBuf),
    Downloaded { path: PathBuf, bytes: usize },
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DownloadReport {
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.skipped.len() + self.failed.len()
    }
}

/// A dataflow listed by the ABS SDMX API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Dataflow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Dataflow {
    pub fn is_agricultural(&self) -> bool {
        let text = format!(
            "{} {}",
            self.name.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        ABS_DATAFLOW_KEYWORDS.iter().any(|kw| text.contains(kw))
    }
}

#[derive(Debug, Deserialize)]
struct DataflowResponse {
    #[serde(default)]
    data: DataflowData,
}

#[derive(Debug, Default, Deserialize)]
struct DataflowData {
    #[serde(default)]
    dataflows: Vec<Dataflow>,
}

/// Fetches source workbooks into the raw data directory
#[derive(Clone)]
pub struct SourceDownloader {
    client: Client,
    /// Replaces scheme and host of target URLs (for testing against a mock server)
    base_url: Option<String>,
    api_base: String,
}

impl SourceDownloader {
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        api_base: impl Into<String>,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            base_url: None,
            api_base: api_base.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, DownloadError> {
        Self::new(
            Duration::from_secs(config.download_timeout_secs),
            &config.user_agent,
            config.abs_api_base.clone(),
        )
    }

    /// Send every request to `base_url`, keeping only the path of target URLs
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn resolve_url(&self, url: &str) -> Result<String, DownloadError> {
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl(format!("{url}: {e}")))?;
        Ok(match &self.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), parsed.path()),
            None => parsed.to_string(),
        })
    }

    /// GET a URL and return the body
    #[instrument(skip(self))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let url = self.resolve_url(url)?;
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!("Downloaded {url} ({} bytes)", bytes.len());
            Ok(bytes.to_vec())
        } else if status.as_u16() == 404 {
            Err(DownloadError::NotFound(format!("{url} not found on server")))
        } else if status.is_server_error() {
            Err(DownloadError::ServerError(format!(
                "Server error {status} while downloading {url}"
            )))
        } else {
            Err(DownloadError::UnexpectedStatus(format!("{status} for {url}")))
        }
    }

    /// Download `url` to `dest` unless it already exists (or `force` is set)
    ///
    /// The body goes to a temporary file next to `dest` and is moved into
    /// place only once complete.
    #[instrument(skip(self), fields(dest = %dest.display()))]
    pub async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        force: bool,
    ) -> Result<DownloadOutcome, DownloadError> {
        if dest.exists() && !force {
            info!("Already exists: {}", dest.display());
            return Ok(DownloadOutcome::Skipped(dest.to_path_buf()));
        }

        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        info!("Downloading: {}", url);
        let bytes = self.fetch_bytes(url).await?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&dir)?;
        temp_file.write_all(&bytes)?;
        temp_file.persist(dest).map_err(|e| e.error)?;

        info!(
            "Saved: {} ({:.1} KB)",
            dest.display(),
            bytes.len() as f64 / 1024.0
        );
        Ok(DownloadOutcome::Downloaded {
            path: dest.to_path_buf(),
            bytes: bytes.len(),
        })
    }

    /// Download every target into `raw_dir/<publisher>/`, continuing past failures
    #[instrument(skip(self, targets), fields(count = targets.len()))]
    pub async fn download_all(
        &self,
        targets: &[DownloadTarget],
        raw_dir: &Path,
        force: bool,
    ) -> DownloadReport {
        let mut report = DownloadReport::default();

        for target in targets {
            let dest = raw_dir
                .join(target.publisher.subdir())
                .join(target.file_name());
            match self.download_to(target.url, &dest, force).await {
                Ok(DownloadOutcome::Skipped(_)) => report.skipped.push(target.name.to_string()),
                Ok(DownloadOutcome::Downloaded { .. }) => {
                    report.downloaded.push(target.name.to_string())
                }
                Err(e) => {
                    warn!(target = target.name, error = %e, "Download failed");
                    report.failed.push((target.name.to_string(), e.to_string()));
                }
            }
        }

        info!(
            "Downloads: {} new, {} already present, {} failed",
            report.downloaded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    /// List ABS API dataflows that look agricultural
    #[instrument(skip(self), fields(api_base = %self.api_base))]
    pub async fn probe_abs_dataflows(&self) -> Result<Vec<Dataflow>, DownloadError> {
        let url = format!(
            "{}/dataflow/ABS?detail=allstubs",
            self.api_base.trim_end_matches('/')
        );
        debug!("Probing ABS data API at {url}");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(API_PROBE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(if status.is_server_error() {
                DownloadError::ServerError(format!("ABS API returned {status}"))
            } else {
                DownloadError::UnexpectedStatus(format!("ABS API returned {status}"))
            });
        }

        let body: DataflowResponse = response.json().await?;
        let flows: Vec<Dataflow> = body
            .data
            .dataflows
            .into_iter()
            .filter(Dataflow::is_agricultural)
            .collect();

        for flow in &flows {
            info!(
                "Found: {} - {}",
                flow.id,
                flow.name.as_deref().unwrap_or_default()
            );
        }
        Ok(flows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_target_path() {
        let downloader = SourceDownloader::new(Duration::from_secs(5), "test", "http://api")
            .unwrap()
            .with_base_url("http://127.0.0.1:1234/");

        let resolved = downloader
            .resolve_url("https://www.abs.gov.au/statistics/file.xlsx")
            .unwrap();
        assert_eq!(resolved, "http://127.0.0.1:1234/statistics/file.xlsx");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let downloader = SourceDownloader::new(Duration::from_secs(5), "test", "http://api").unwrap();
        assert!(matches!(
            downloader.resolve_url("not a url"),
            Err(DownloadError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_dataflow_keyword_filter() {
        let flow = |name: &str| Dataflow {
            id: "X".to_string(),
            name: Some(name.to_string()),
            description: None,
        };
        assert!(flow("Livestock Products").is_agricultural());
        assert!(flow("Value of Agricultural Commodities").is_agricultural());
        assert!(!flow("Consumer Price Index").is_agricultural());
    }
}
