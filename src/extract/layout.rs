//! Declarative table layouts and the two layout-family extractors

use calamine::{Data, Range};
use tracing::{debug, instrument};

use super::cells::{cell, cell_text, clean_value, last_position, parse_fy_year, parse_integer_year};
use super::{ExtractError, Workbook};
use crate::catalog::region_code_for_label;
use crate::conversions::Conversion;
use crate::observation::{Confidence, ObservationRecord, PeriodKind};

/// Inclusive range of years a table is allowed to contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub min: i32,
    pub max: Option<i32>,
}

impl YearBounds {
    pub const fn at_least(min: i32) -> Self {
        Self { min, max: None }
    }

    pub const fn between(min: i32, max: i32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && self.max.map_or(true, |max| year <= max)
    }
}

/// How year labels are written in a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearLabel {
    /// "1973-74", "1973–74" or a plain 4-digit year
    Financial,
    /// Integer or integer-valued float, e.g. 1860 or "1860.0"
    Integer,
}

impl YearLabel {
    fn parse(&self, cell: &Data) -> Option<i32> {
        match self {
            YearLabel::Financial => parse_fy_year(cell),
            YearLabel::Integer => parse_integer_year(cell),
        }
    }
}

/// A column (row-per-year tables) or row (wide tables) mapped to one variable
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub offset: usize,
    pub variable_id: &'static str,
    pub region: &'static str,
    /// Unit as printed in the source table
    pub original_unit: &'static str,
    pub conversion: Conversion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderLocator {
    /// First row within `scan_rows` with a cell containing `label`
    Sentinel { label: &'static str, scan_rows: usize },
    /// Header at a known absolute row
    FixedRow(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowSelector {
    /// Every row below the header whose label cell names a known region
    ByRegionLabel {
        label_column: usize,
        variable_id: &'static str,
        original_unit: &'static str,
        conversion: Conversion,
    },
    /// Known rows, each mapped to a variable
    Fixed(Vec<FieldMapping>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutKind {
    /// One row per year, a year label in `year_column` and values in fixed columns
    RowPerYear {
        year_column: usize,
        columns: Vec<FieldMapping>,
    },
    /// Years across a header row, one row per region or variable
    Wide {
        header: HeaderLocator,
        first_year_column: usize,
        rows: RowSelector,
    },
}

/// Where a logical table lives in a workbook and how to read it
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub sheet: &'static str,
    pub title: &'static str,
    pub period_kind: PeriodKind,
    pub year_label: YearLabel,
    pub years: YearBounds,
    pub confidence: Confidence,
    pub kind: LayoutKind,
}

/// Extract every observation a table layout describes
///
/// Cells that are empty or hold missing-data markers produce no record.
#[instrument(skip(workbook, layout), fields(workbook = workbook.name(), sheet = layout.sheet))]
pub fn extract_table(
    workbook: &Workbook,
    layout: &TableLayout,
) -> Result<Vec<ObservationRecord>, ExtractError> {
    let (sheet_name, range) = workbook.sheet(layout.sheet)?;

    let records = match &layout.kind {
        LayoutKind::RowPerYear {
            year_column,
            columns,
        } => extract_row_per_year(layout, sheet_name, range, *year_column, columns)?,
        LayoutKind::Wide {
            header,
            first_year_column,
            rows,
        } => extract_wide(layout, sheet_name, range, header, *first_year_column, rows)?,
    };

    debug!("Extracted {} records from {}", records.len(), sheet_name);
    Ok(records)
}

fn extract_row_per_year(
    layout: &TableLayout,
    sheet_name: &str,
    range: &Range<Data>,
    year_column: usize,
    columns: &[FieldMapping],
) -> Result<Vec<ObservationRecord>, ExtractError> {
    let mut records = Vec::new();
    let Some((last_row, _)) = last_position(range) else {
        return Ok(records);
    };

    for row in 0..=last_row {
        let Some(year) = cell(range, row, year_column).and_then(|c| layout.year_label.parse(c))
        else {
            continue;
        };
        if !layout.years.contains(year) {
            continue;
        }

        for mapping in columns {
            let Some(raw) = cell(range, row, mapping.offset).and_then(clean_value) else {
                continue;
            };
            records.push(build_record(
                layout,
                sheet_name,
                mapping.variable_id,
                mapping.region,
                mapping.original_unit,
                &mapping.conversion,
                year,
                raw,
            )?);
        }
    }

    Ok(records)
}

fn extract_wide(
    layout: &TableLayout,
    sheet_name: &str,
    range: &Range<Data>,
    header: &HeaderLocator,
    first_year_column: usize,
    rows: &RowSelector,
) -> Result<Vec<ObservationRecord>, ExtractError> {
    let mut records = Vec::new();
    let (header_row, last_row, last_col) = locate_header(sheet_name, range, header)?;

    let year_columns: Vec<(usize, i32)> = (first_year_column..=last_col)
        .filter_map(|col| {
            let year = cell(range, header_row, col).and_then(|c| layout.year_label.parse(c))?;
            layout.years.contains(year).then_some((col, year))
        })
        .collect();
    debug!(
        "Header row {} in {} has {} year columns",
        header_row,
        sheet_name,
        year_columns.len()
    );

    match rows {
        RowSelector::ByRegionLabel {
            label_column,
            variable_id,
            original_unit,
            conversion,
        } => {
            for row in header_row + 1..=last_row {
                let Some(region) = cell(range, row, *label_column)
                    .and_then(cell_text)
                    .and_then(|label| region_code_for_label(&label))
                else {
                    continue;
                };

                for &(col, year) in &year_columns {
                    let Some(raw) = cell(range, row, col).and_then(clean_value) else {
                        continue;
                    };
                    records.push(build_record(
                        layout,
                        sheet_name,
                        variable_id,
                        region,
                        original_unit,
                        conversion,
                        year,
                        raw,
                    )?);
                }
            }
        }
        RowSelector::Fixed(mappings) => {
            for mapping in mappings {
                for &(col, year) in &year_columns {
                    let Some(raw) = cell(range, mapping.offset, col).and_then(clean_value) else {
                        continue;
                    };
                    records.push(build_record(
                        layout,
                        sheet_name,
                        mapping.variable_id,
                        mapping.region,
                        mapping.original_unit,
                        &mapping.conversion,
                        year,
                        raw,
                    )?);
                }
            }
        }
    }

    Ok(records)
}

/// Returns (header row, last row, last column)
fn locate_header(
    sheet_name: &str,
    range: &Range<Data>,
    header: &HeaderLocator,
) -> Result<(usize, usize, usize), ExtractError> {
    let not_found = || ExtractError::HeaderNotFound {
        sheet: sheet_name.to_string(),
        locator: match header {
            HeaderLocator::Sentinel { label, .. } => format!("'{label}'"),
            HeaderLocator::FixedRow(row) => format!("row {row}"),
        },
    };

    let (last_row, last_col) = last_position(range).ok_or_else(not_found)?;

    let header_row = match header {
        HeaderLocator::Sentinel { label, scan_rows } => find_sentinel(range, label, *scan_rows)
            .map(|(row, _)| row)
            .ok_or_else(not_found)?,
        HeaderLocator::FixedRow(row) if *row <= last_row => *row,
        HeaderLocator::FixedRow(_) => return Err(not_found()),
    };

    Ok((header_row, last_row, last_col))
}

/// First absolute (row, column) within the top `scan_rows` rows whose text
/// contains `label`
pub fn find_sentinel(range: &Range<Data>, label: &str, scan_rows: usize) -> Option<(usize, usize)> {
    let (last_row, last_col) = last_position(range)?;
    (0..scan_rows.min(last_row + 1)).find_map(|row| {
        (0..=last_col)
            .find(|&col| {
                cell(range, row, col)
                    .and_then(cell_text)
                    .is_some_and(|text| text.contains(label))
            })
            .map(|col| (row, col))
    })
}

#[allow(clippy::too_many_arguments)]
fn build_record(
    layout: &TableLayout,
    sheet_name: &str,
    variable_id: &str,
    region: &str,
    original_unit: &str,
    conversion: &Conversion,
    year: i32,
    raw: f64,
) -> Result<ObservationRecord, ExtractError> {
    let converted = conversion.apply(raw)?;
    Ok(ObservationRecord {
        variable_id: variable_id.to_string(),
        region: region.to_string(),
        year,
        period_kind: layout.period_kind,
        value: Some(converted).filter(|v| v.is_finite()),
        original_value: Some(raw),
        original_unit: Some(original_unit.to_string()),
        confidence: layout.confidence,
        notes: None,
        source_page: Some(sheet_name.to_string()),
    })
}
