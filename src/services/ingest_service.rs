use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::db::{DbError, DbPool, ObservationRepository, ProvenanceContext};
use crate::extract::{all_sources, extract_table, SourceSpec, Workbook};
use crate::observation::ObservationRecord;

/// Error types for ingest runs
///
/// Table and row failures are isolated and reported, not raised. Only store
/// infrastructure failures end a run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

/// A table that could not be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFailure {
    pub table: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    pub source: String,
    pub file: Option<PathBuf>,
    /// Why the whole source was skipped, if it was
    pub skipped: Option<String>,
    pub extracted: usize,
    /// Records dropped for having no value
    pub dropped: usize,
    pub written: usize,
    pub failed: usize,
    pub table_failures: Vec<TableFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    pub fn written(&self) -> usize {
        self.sources.iter().map(|s| s.written).sum()
    }

    pub fn failed(&self) -> usize {
        self.sources.iter().map(|s| s.failed).sum()
    }
}

/// Runs every extractor, drops empty records and upserts the rest with provenance
#[derive(Clone)]
pub struct IngestService {
    db: DbPool,
    observations: ObservationRepository,
    sources: Vec<SourceSpec>,
    processed_dir: Option<PathBuf>,
}

impl IngestService {
    pub fn new(db: DbPool) -> Self {
        Self {
            observations: ObservationRepository::new(db.pool().clone()),
            db,
            sources: all_sources(),
            processed_dir: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceSpec>) -> Self {
        self.sources = sources;
        self
    }

    /// Also write each source's surviving records to `<dir>/<source>_parsed.csv`
    pub fn with_processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.processed_dir = Some(dir.into());
        self
    }

    /// Initialise the store, then ingest every source found under `raw_dir`
    ///
    /// A missing or unreadable workbook skips that source; a failing table is
    /// logged and the other tables still load.
    #[instrument(skip(self), fields(raw_dir = %raw_dir.display()))]
    pub async fn run(&self, raw_dir: &Path) -> Result<IngestReport, IngestError> {
        let start_time = Instant::now();
        info!("Initialising store");
        self.db.init_store().await?;

        let mut report = IngestReport::default();
        for source in &self.sources {
            let name = source.descriptor.name;
            info!("Parsing {}", name);

            let path = match source.resolve_file(raw_dir) {
                Ok(path) => path,
                Err(e) => {
                    warn!(source = name, error = %e, "Source file not found, skipping");
                    report.sources.push(SourceReport {
                        source: name.to_string(),
                        skipped: Some(e.to_string()),
                        ..Default::default()
                    });
                    continue;
                }
            };

            let workbook = match Workbook::open(&path) {
                Ok(workbook) => workbook,
                Err(e) => {
                    error!(source = name, error = %e, "Failed to open workbook, skipping");
                    report.sources.push(SourceReport {
                        source: name.to_string(),
                        file: Some(path),
                        skipped: Some(e.to_string()),
                        ..Default::default()
                    });
                    continue;
                }
            };

            let mut source_report = self.ingest_workbook(source, &workbook).await?;
            source_report.file = Some(path);
            report.sources.push(source_report);
        }

        info!(
            "Ingest complete in {:.2}s: {} observations written, {} failed",
            start_time.elapsed().as_secs_f64(),
            report.written(),
            report.failed()
        );
        Ok(report)
    }

    /// Extract, filter and store one already-opened source workbook
    #[instrument(skip(self, source, workbook), fields(source = source.descriptor.name, workbook = workbook.name()))]
    pub async fn ingest_workbook(
        &self,
        source: &SourceSpec,
        workbook: &Workbook,
    ) -> Result<SourceReport, IngestError> {
        let mut report = SourceReport {
            source: source.descriptor.name.to_string(),
            ..Default::default()
        };

        let mut extracted = Vec::new();
        for table in &source.tables {
            match extract_table(workbook, table) {
                Ok(records) => {
                    info!("{} ({}): {} observations", table.sheet, table.title, records.len());
                    extracted.extend(records);
                }
                Err(e) => {
                    error!(
                        table = table.sheet,
                        source = source.descriptor.name,
                        error = %e,
                        "Table extraction failed, continuing with remaining tables"
                    );
                    report.table_failures.push(TableFailure {
                        table: table.sheet.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.extracted = extracted.len();
        let records: Vec<ObservationRecord> =
            extracted.into_iter().filter(|r| r.value.is_some()).collect();
        report.dropped = report.extracted - records.len();

        if let Some(dir) = &self.processed_dir {
            let path = dir.join(source.processed_name);
            if let Err(e) = write_processed(&path, &records) {
                warn!(path = %path.display(), error = %e, "Failed to write processed CSV");
            }
        }

        let provenance = ProvenanceContext::scrape(source.descriptor, Utc::now().date_naive());
        let upserted = self.observations.upsert_batch(&records, &provenance).await?;
        report.written = upserted.written;
        report.failed = upserted.failed;

        info!(
            "{}: {} extracted, {} dropped, {} written, {} failed, {} tables failed",
            report.source,
            report.extracted,
            report.dropped,
            report.written,
            report.failed,
            report.table_failures.len()
        );
        Ok(report)
    }
}

fn write_processed(path: &Path, records: &[ObservationRecord]) -> Result<(), DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}
