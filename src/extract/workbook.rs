use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

use super::ExtractError;

/// All worksheets of a source file, loaded once
pub struct Workbook {
    name: String,
    sheets: Vec<(String, Range<Data>)>,
}

impl Workbook {
    /// Open an xlsx file and read every sheet into memory
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let mut workbook: Xlsx<BufReader<File>> =
            open_workbook(path).map_err(|e: XlsxError| ExtractError::WorkbookOpen {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names() {
            match workbook.worksheet_range(&sheet_name) {
                Ok(range) => {
                    debug!("Loaded sheet '{}' ({:?})", sheet_name, range.get_size());
                    sheets.push((sheet_name, range));
                }
                Err(e) => {
                    warn!("Skipping unreadable sheet '{}': {}", sheet_name, e);
                }
            }
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, sheets })
    }

    /// Build a workbook from ranges already in memory
    pub fn from_sheets(name: impl Into<String>, sheets: Vec<(String, Range<Data>)>) -> Self {
        Self {
            name: name.into(),
            sheets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Look up a sheet, tolerating the "Table6.1" / "Table 6.1" spelling
    /// difference between editions. Returns the resolved name and its range.
    pub fn sheet(&self, requested: &str) -> Result<(&str, &Range<Data>), ExtractError> {
        let candidates = [
            requested.to_string(),
            requested.replace("Table", "Table "),
            requested.replace("Table ", "Table"),
        ];

        for candidate in &candidates {
            if let Some((name, range)) = self.sheets.iter().find(|(name, _)| name == candidate) {
                return Ok((name.as_str(), range));
            }
        }

        Err(ExtractError::SheetNotFound {
            sheet: requested.to_string(),
            available: self.sheets.iter().map(|(name, _)| name.clone()).collect(),
        })
    }
}
