#![allow(dead_code)]

use calamine::{Data, Range};
use chrono::NaiveDate;
use dairy_stats::catalog::SourceDescriptor;
use dairy_stats::db::{DbPool, ProvenanceContext};
use dairy_stats::observation::{Confidence, ObservationRecord, PeriodKind};
use tempfile::TempDir;

pub const TEST_SOURCE: SourceDescriptor = SourceDescriptor {
    name: "Test Commodity Statistics",
    source_type: "abares",
    url: "https://example.test/acs",
};

/// A migrated, seeded SQLite store in its own temporary directory
///
/// Keep the struct alive for the duration of the test; dropping it removes
/// the database file.
pub struct TestStore {
    pub db: DbPool,
    pub dir: TempDir,
}

pub async fn test_store() -> TestStore {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());

    let db = DbPool::connect(&url)
        .await
        .expect("Failed to connect to test database");
    db.init_store().await.expect("Failed to initialise store");

    TestStore { db, dir }
}

pub fn provenance() -> ProvenanceContext {
    ProvenanceContext::scrape(
        TEST_SOURCE,
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
    )
}

pub fn record(variable_id: &str, region: &str, year: i32, value: f64) -> ObservationRecord {
    ObservationRecord {
        variable_id: variable_id.to_string(),
        region: region.to_string(),
        year,
        period_kind: PeriodKind::FiscalYear,
        value: Some(value),
        original_value: Some(value),
        original_unit: None,
        confidence: Confidence::High,
        notes: None,
        source_page: Some("Table 6.1".to_string()),
    }
}

pub fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

pub fn num(value: f64) -> Data {
    Data::Float(value)
}

/// Build a worksheet range anchored at A1 from rows of cells
pub fn sheet(rows: Vec<Vec<Data>>) -> Range<Data> {
    let height = rows.len().max(1) as u32;
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1) as u32;

    let mut range = Range::new((0, 0), (height - 1, width - 1));
    for (r, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            range.set_value((r as u32, c as u32), value);
        }
    }
    range
}

/// An ABARES-style row-per-year sheet: title rows, then year label in column B
pub fn row_per_year_sheet(rows: &[(&str, Vec<Data>)]) -> Range<Data> {
    let mut cells = vec![
        vec![text("Table 6.1 Summary of Australian dairy statistics")],
        vec![text("Edition 2018")],
        vec![Data::Empty, text("Year"), text("Cows"), text("Yield"), text("Milk")],
    ];
    for (year, values) in rows {
        let mut row = vec![Data::Empty, text(year)];
        row.extend(values.iter().cloned());
        cells.push(row);
    }
    sheet(cells)
}

/// An ABS historic region-per-row sheet with the "Region label" header on row 5
pub fn abs_region_sheet(years: &[i32], rows: &[(&str, Vec<Data>)]) -> Range<Data> {
    let mut header = vec![text("Region label"), text("Unit of measure")];
    header.extend(years.iter().map(|&y| num(y as f64)));

    let mut cells = vec![
        vec![text("Australian Bureau of Statistics")],
        vec![text("Historical Selected Agricultural Commodities")],
        vec![],
        vec![text("Table 8 Dairy cattle")],
        header,
    ];
    for (label, values) in rows {
        let mut row = vec![text(label), text("no.")];
        row.extend(values.iter().cloned());
        cells.push(row);
    }
    sheet(cells)
}
