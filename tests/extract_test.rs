// Extractor tests against in-memory workbooks shaped like the source tables

mod common;

use calamine::Data;
use common::{abs_region_sheet, num, row_per_year_sheet, sheet, text};
use dairy_stats::extract::layout::TableLayout;
use dairy_stats::extract::{abares, abs_historic, extract_table, ExtractError, Workbook};
use dairy_stats::observation::{Confidence, ObservationRecord, PeriodKind};

fn layout(tables: Vec<TableLayout>, sheet: &str) -> TableLayout {
    tables
        .into_iter()
        .find(|t| t.sheet == sheet)
        .unwrap_or_else(|| panic!("no layout for {sheet}"))
}

fn find<'a>(records: &'a [ObservationRecord], variable_id: &str, region: &str, year: i32) -> Option<&'a ObservationRecord> {
    records
        .iter()
        .find(|r| r.variable_id == variable_id && r.region == region && r.year == year)
}

fn summary_workbook(sheet_name: &str) -> Workbook {
    // C: cows ('000), D: yield, E: milk, F: butter, G: cheese, H/I: export prices ($/t)
    let range = row_per_year_sheet(&[
        (
            "1965-66",
            vec![num(2.9), num(2000.0), num(6000.0), num(200.0), num(50.0), num(700.0), num(600.0)],
        ),
        (
            "1979-80",
            vec![num(1.88), num(2915.0), num(5432.0), text("n.a."), text(".."), text("-"), num(2100.0)],
        ),
        (
            "1980\u{2013}81",
            vec![text("1,832"), num(2981.0), num(5498.0), num(84.5), num(140.25), Data::Empty, Data::Empty],
        ),
        ("Source: ABARES", vec![num(1.0)]),
    ]);
    Workbook::from_sheets("acs2018_dairy.xlsx", vec![(sheet_name.to_string(), range)])
}

#[test]
fn test_row_per_year_table_converts_and_labels_records() {
    let workbook = summary_workbook("Table 6.1");
    let records = extract_table(&workbook, &layout(abares::tables(), "Table 6.1")).unwrap();

    let cows = find(&records, "herd_dairy_cows", "AUS", 1979).unwrap();
    assert_eq!(cows.value, Some(1880.0));
    assert_eq!(cows.original_value, Some(1.88));
    assert_eq!(cows.original_unit.as_deref(), Some("'000 head"));
    assert_eq!(cows.period_kind, PeriodKind::FiscalYear);
    assert_eq!(cows.confidence, Confidence::High);
    assert_eq!(cows.source_page.as_deref(), Some("Table 6.1"));

    // $/t to c/kg
    let cheese_price = find(&records, "price_export_cheese", "AUS", 1979).unwrap();
    assert_eq!(cheese_price.value, Some(210.0));

    // kt to t, with the en-dash year label
    let butter = find(&records, "prod_butter", "AUS", 1980).unwrap();
    assert_eq!(butter.value, Some(84500.0));
    assert_eq!(
        find(&records, "herd_dairy_cows", "AUS", 1980).unwrap().value,
        Some(1_832_000.0)
    );
}

#[test]
fn test_missing_markers_yield_no_observation() {
    let workbook = summary_workbook("Table 6.1");
    let records = extract_table(&workbook, &layout(abares::tables(), "Table 6.1")).unwrap();

    assert!(find(&records, "prod_butter", "AUS", 1979).is_none());
    assert!(find(&records, "prod_cheese", "AUS", 1979).is_none());
    assert!(find(&records, "price_export_butter", "AUS", 1979).is_none());
    assert!(find(&records, "price_export_butter", "AUS", 1980).is_none());
}

#[test]
fn test_rows_before_1970_are_ignored() {
    let workbook = summary_workbook("Table 6.1");
    let records = extract_table(&workbook, &layout(abares::tables(), "Table 6.1")).unwrap();

    assert!(records.iter().all(|r| r.year >= abares::MIN_YEAR));
    // 1979-80 has four values, 1980-81 has five
    assert_eq!(records.len(), 9);
}

#[test]
fn test_sheet_name_spacing_variant_is_found() {
    let workbook = summary_workbook("Table6.1");
    let records = extract_table(&workbook, &layout(abares::tables(), "Table 6.1")).unwrap();
    assert_eq!(records.len(), 9);
    assert!(records.iter().all(|r| r.source_page.as_deref() == Some("Table6.1")));
}

#[test]
fn test_extraction_is_repeatable() {
    let workbook = summary_workbook("Table 6.1");
    let table = layout(abares::tables(), "Table 6.1");

    let first = extract_table(&workbook, &table).unwrap();
    let second = extract_table(&workbook, &table).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_sheet_is_reported() {
    let workbook = summary_workbook("Contents");
    let result = extract_table(&workbook, &layout(abares::tables(), "Table 6.1"));

    match result {
        Err(ExtractError::SheetNotFound { sheet, available }) => {
            assert_eq!(sheet, "Table 6.1");
            assert_eq!(available, vec!["Contents".to_string()]);
        }
        other => panic!("Expected SheetNotFound, got {other:?}"),
    }
}

#[test]
fn test_wide_table_with_fixed_header_row() {
    let mut rows: Vec<Vec<Data>> = vec![vec![]; 13];
    rows[0] = vec![text("Table 6.6 Manufacture of dairy products")];
    rows[7] = vec![Data::Empty, Data::Empty, text("unit"), text("1969-70"), text("1980-81"), text("1981-82")];
    rows[8] = vec![text("Butter"), Data::Empty, text("kt"), num(200.0), num(80.5), text("n.a.")];
    rows[9] = vec![text("Cheese"), Data::Empty, text("kt"), num(60.0), num(150.0), num(155.5)];
    rows[12] = vec![text("Skim milk powder"), Data::Empty, text("kt"), num(90.0), Data::Empty, num(100.0)];
    let workbook = Workbook::from_sheets("acs2018_dairy.xlsx", vec![("Table 6.6".to_string(), sheet(rows))]);

    let records = extract_table(&workbook, &layout(abares::tables(), "Table 6.6")).unwrap();

    assert_eq!(find(&records, "prod_butter", "AUS", 1980).unwrap().value, Some(80500.0));
    assert!(find(&records, "prod_butter", "AUS", 1981).is_none());
    assert_eq!(find(&records, "prod_cheese", "AUS", 1981).unwrap().value, Some(155500.0));
    assert_eq!(find(&records, "prod_milk_powder", "AUS", 1981).unwrap().value, Some(100000.0));
    assert!(records.iter().all(|r| r.year >= 1970));
    assert_eq!(records.len(), 4);
}

#[test]
fn test_wide_table_header_row_beyond_sheet_is_an_error() {
    let rows = vec![vec![text("Table 6.7")], vec![text("too short")]];
    let workbook = Workbook::from_sheets("acs2018_dairy.xlsx", vec![("Table 6.7".to_string(), sheet(rows))]);

    let result = extract_table(&workbook, &layout(abares::tables(), "Table 6.7"));
    assert!(matches!(result, Err(ExtractError::HeaderNotFound { .. })));
}

#[test]
fn test_abs_sentinel_header_and_region_labels() {
    let range = abs_region_sheet(
        &[1859, 1860, 1861, 2022],
        &[
            ("New South Wales", vec![num(10.0), num(100.0), num(110.0), num(300_000.0)]),
            ("Australia", vec![num(20.0), num(200.0), text("np"), num(1_400_000.0)]),
            ("Total", vec![num(1.0), num(1.0), num(1.0), num(1.0)]),
            ("Darling Downs", vec![num(5.0), num(5.0), num(5.0), num(5.0)]),
        ],
    );
    let workbook = Workbook::from_sheets(
        "historic_ag_commodities_1860_2022.xlsx",
        vec![("Table 8".to_string(), range)],
    );

    let records = extract_table(&workbook, &layout(abs_historic::tables(), "Table 8")).unwrap();

    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.variable_id == "herd_dairy_cattle"));
    assert!(records.iter().all(|r| r.period_kind == PeriodKind::CalendarYear));
    assert!(records.iter().all(|r| r.region == "NSW" || r.region == "AUS"));
    assert!(find(&records, "herd_dairy_cattle", "NSW", 1859).is_none());
    assert!(find(&records, "herd_dairy_cattle", "AUS", 1861).is_none());

    let aus = find(&records, "herd_dairy_cattle", "AUS", 2022).unwrap();
    assert_eq!(aus.value, Some(1_400_000.0));
    assert_eq!(aus.original_unit.as_deref(), Some("head"));
}

#[test]
fn test_abs_table_without_sentinel_fails() {
    let rows = vec![
        vec![text("Australian Bureau of Statistics")],
        vec![text("Region"), text("Unit"), num(1860.0)],
        vec![text("Australia"), text("no."), num(1.0)],
    ];
    let workbook = Workbook::from_sheets("abs.xlsx", vec![("Table 6".to_string(), sheet(rows))]);

    match extract_table(&workbook, &layout(abs_historic::tables(), "Table 6")) {
        Err(ExtractError::HeaderNotFound { sheet, locator }) => {
            assert_eq!(sheet, "Table 6");
            assert!(locator.contains("Region label"));
        }
        other => panic!("Expected HeaderNotFound, got {other:?}"),
    }
}

#[test]
fn test_source_file_resolution_prefers_newest_edition() {
    let dir = tempfile::tempdir().unwrap();
    let source = abares::source();

    assert!(matches!(
        source.resolve_file(dir.path()),
        Err(ExtractError::SourceFileMissing { .. })
    ));

    let abares_dir = dir.path().join("abares");
    std::fs::create_dir_all(&abares_dir).unwrap();
    std::fs::write(abares_dir.join("acs2017_dairy.xlsx"), b"x").unwrap();
    assert_eq!(
        source.resolve_file(dir.path()).unwrap(),
        abares_dir.join("acs2017_dairy.xlsx")
    );

    std::fs::write(abares_dir.join("acs2018_dairy.xlsx"), b"x").unwrap();
    assert_eq!(
        source.resolve_file(dir.path()).unwrap(),
        abares_dir.join("acs2018_dairy.xlsx")
    );
}

#[test]
fn test_unreadable_workbook_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a zip archive").unwrap();

    assert!(matches!(
        Workbook::open(&path),
        Err(ExtractError::WorkbookOpen { .. })
    ));
}
