use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/dairy_stats.db";
pub const DEFAULT_USER_AGENT: &str = "AusDairyStats/1.0 (academic research project)";
pub const DEFAULT_ABS_API_BASE: &str = "https://data.api.abs.gov.au/rest";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Root of raw/, processed/ and final/
    pub data_dir: PathBuf,
    pub figure_dir: PathBuf,
    pub download_timeout_secs: u64,
    pub user_agent: String,
    pub abs_api_base: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            figure_dir: env::var("FIGURE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("paper/figures")),
            download_timeout_secs: env::var("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            user_agent: env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            abs_api_base: env::var("ABS_API_BASE")
                .unwrap_or_else(|_| DEFAULT_ABS_API_BASE.to_string()),
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    /// Default location of the flat CSV export
    pub fn export_path(&self) -> PathBuf {
        self.data_dir.join("final").join("aus_dairy_stats.csv")
    }
}
