//! Spreadsheet table extractors for the ABARES and ABS source workbooks

pub mod abares;
pub mod abs_historic;
pub mod cells;
pub mod layout;
pub mod workbook;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::SourceDescriptor;
use crate::conversions::ConversionError;

pub use layout::{extract_table, TableLayout};
pub use workbook::Workbook;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to open workbook {path}: {message}")]
    WorkbookOpen { path: PathBuf, message: String },

    #[error("No source file found in {dir} (tried {candidates:?})")]
    SourceFileMissing {
        dir: PathBuf,
        candidates: Vec<String>,
    },

    #[error("Sheet '{sheet}' not found. Available: {available:?}")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("Could not find header row ({locator}) in {sheet}")]
    HeaderNotFound { sheet: String, locator: String },

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

/// One publisher workbook and the tables read from it
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub descriptor: SourceDescriptor,
    /// Subdirectory of the raw data directory holding the workbook
    pub subdir: &'static str,
    /// File names tried in order, newest edition first
    pub file_candidates: &'static [&'static str],
    pub tables: Vec<TableLayout>,
    /// File name of the per-source processed CSV
    pub processed_name: &'static str,
}

impl SourceSpec {
    /// First candidate file that exists under `raw_dir`
    pub fn resolve_file(&self, raw_dir: &Path) -> Result<PathBuf, ExtractError> {
        let dir = raw_dir.join(self.subdir);
        self.file_candidates
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| ExtractError::SourceFileMissing {
                dir,
                candidates: self.file_candidates.iter().map(|c| c.to_string()).collect(),
            })
    }
}

/// Every source the ingest pipeline knows how to read
pub fn all_sources() -> Vec<SourceSpec> {
    vec![abares::source(), abs_historic::source()]
}
