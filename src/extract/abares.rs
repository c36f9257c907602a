//! ABARES Agricultural Commodity Statistics, dairy chapter (tables 6.1 to 6.9)
//!
//! All tables are financial-year and start in the early 1970s. Rows above the
//! data often contain 4-digit numbers (edition years, footnotes), so only years
//! from 1970 on are accepted.

use super::layout::{
    FieldMapping, HeaderLocator, LayoutKind, RowSelector, TableLayout, YearBounds, YearLabel,
};
use super::SourceSpec;
use crate::catalog::{SourceDescriptor, NATIONAL};
use crate::conversions::Conversion;
use crate::observation::{Confidence, PeriodKind};

pub const SOURCE: SourceDescriptor = SourceDescriptor {
    name: "ABARES Agricultural Commodity Statistics 2018",
    source_type: "abares",
    url: "https://data.gov.au/data/dataset/agricultural-commodity-statistics-2017",
};

/// 2018 edition first, the downloadable 2017 edition as fallback
pub const FILE_CANDIDATES: &[&str] = &["acs2018_dairy.xlsx", "acs2017_dairy.xlsx"];

pub const MIN_YEAR: i32 = 1970;

const YEAR_COLUMN: usize = 1;

/// Header row and first year column of the wide tables 6.6 and 6.7
const WIDE_HEADER_ROW: usize = 7;
const WIDE_FIRST_YEAR_COLUMN: usize = 3;

/// Columns of the state tables 6.4 and 6.5
const STATE_COLUMNS: [(usize, &str); 7] = [
    (2, "NSW"),
    (3, "VIC"),
    (4, "QLD"),
    (5, "SA"),
    (6, "WA"),
    (7, "TAS"),
    (8, NATIONAL),
];

const THOUSANDS: Conversion = Conversion::Scale(1000.0);
const KILOTONNES: Conversion = Conversion::Weight {
    from: "kilotonnes",
    to: "tonnes",
};
const DOLLARS_PER_TONNE: Conversion = Conversion::PricePerWeight {
    price: "dollars",
    weight: "tonne",
};

pub fn source() -> SourceSpec {
    SourceSpec {
        descriptor: SOURCE,
        subdir: "abares",
        file_candidates: FILE_CANDIDATES,
        tables: tables(),
        processed_name: "abares_dairy_parsed.csv",
    }
}

pub fn tables() -> Vec<TableLayout> {
    vec![
        national_summary(),
        state_table(
            "Table 6.4",
            "Dairy cow numbers by state",
            "herd_dairy_cows",
            "'000 head",
            THOUSANDS,
        ),
        state_table(
            "Table 6.5",
            "Whole milk production by state",
            "prod_milk_total",
            "ML",
            Conversion::Identity,
        ),
        wide_table(
            "Table 6.6",
            "Manufacture of dairy products",
            vec![
                national(8, "prod_butter", "kt", KILOTONNES),
                national(9, "prod_cheese", "kt", KILOTONNES),
                national(12, "prod_milk_powder", "kt", KILOTONNES),
            ],
        ),
        wide_table(
            "Table 6.7",
            "Consumption of dairy products",
            vec![
                national(13, "cons_milk_total", "ML", Conversion::Identity),
                national(15, "cons_butter_percap", "kg", Conversion::Identity),
                national(16, "cons_cheese_percap", "kg", Conversion::Identity),
                national(19, "cons_milk_percap", "L", Conversion::Identity),
            ],
        ),
        row_per_year(
            "Table 6.8",
            "Milk prices",
            vec![
                national(2, "price_farmgate_manufacturing", "c/L", Conversion::Identity),
                national(3, "price_farmgate_market", "c/L", Conversion::Identity),
                national(4, "price_farmgate_avg", "c/L", Conversion::Identity),
            ],
        ),
        row_per_year(
            "Table 6.9",
            "Average export unit values",
            vec![
                national(2, "price_export_butter", "$/t", DOLLARS_PER_TONNE),
                national(3, "price_export_cheese", "$/t", DOLLARS_PER_TONNE),
            ],
        ),
    ]
}

/// Table 6.1, national summary: herd, yield, production and export prices
fn national_summary() -> TableLayout {
    row_per_year(
        "Table 6.1",
        "Summary of Australian dairy statistics",
        vec![
            national(2, "herd_dairy_cows", "'000 head", THOUSANDS),
            national(3, "herd_yield_per_cow", "L", Conversion::Identity),
            national(4, "prod_milk_total", "ML", Conversion::Identity),
            national(5, "prod_butter", "kt", KILOTONNES),
            national(6, "prod_cheese", "kt", KILOTONNES),
            national(7, "price_export_butter", "$/t", DOLLARS_PER_TONNE),
            national(8, "price_export_cheese", "$/t", DOLLARS_PER_TONNE),
        ],
    )
}

fn national(
    offset: usize,
    variable_id: &'static str,
    original_unit: &'static str,
    conversion: Conversion,
) -> FieldMapping {
    FieldMapping {
        offset,
        variable_id,
        region: NATIONAL,
        original_unit,
        conversion,
    }
}

fn state_table(
    sheet: &'static str,
    title: &'static str,
    variable_id: &'static str,
    original_unit: &'static str,
    conversion: Conversion,
) -> TableLayout {
    let columns = STATE_COLUMNS
        .iter()
        .map(|&(offset, region)| FieldMapping {
            offset,
            variable_id,
            region,
            original_unit,
            conversion: conversion.clone(),
        })
        .collect();
    row_per_year(sheet, title, columns)
}

fn row_per_year(sheet: &'static str, title: &'static str, columns: Vec<FieldMapping>) -> TableLayout {
    TableLayout {
        sheet,
        title,
        period_kind: PeriodKind::FiscalYear,
        year_label: YearLabel::Financial,
        years: YearBounds::at_least(MIN_YEAR),
        confidence: Confidence::High,
        kind: LayoutKind::RowPerYear {
            year_column: YEAR_COLUMN,
            columns,
        },
    }
}

fn wide_table(sheet: &'static str, title: &'static str, rows: Vec<FieldMapping>) -> TableLayout {
    TableLayout {
        sheet,
        title,
        period_kind: PeriodKind::FiscalYear,
        year_label: YearLabel::Financial,
        years: YearBounds::at_least(MIN_YEAR),
        confidence: Confidence::High,
        kind: LayoutKind::Wide {
            header: HeaderLocator::FixedRow(WIDE_HEADER_ROW),
            first_year_column: WIDE_FIRST_YEAR_COLUMN,
            rows: RowSelector::Fixed(rows),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_abares_variable_is_catalogued() {
        for table in tables() {
            let mappings = match &table.kind {
                LayoutKind::RowPerYear { columns, .. } => columns.clone(),
                LayoutKind::Wide {
                    rows: RowSelector::Fixed(rows),
                    ..
                } => rows.clone(),
                LayoutKind::Wide { .. } => panic!("{} should use fixed rows", table.sheet),
            };
            for mapping in mappings {
                assert!(
                    crate::catalog::variable(mapping.variable_id).is_some(),
                    "{} in {}",
                    mapping.variable_id,
                    table.sheet
                );
            }
        }
    }

    #[test]
    fn test_export_price_dollars_per_tonne_to_cents_per_kg() {
        assert_eq!(DOLLARS_PER_TONNE.apply(4500.0).unwrap(), 450.0);
    }
}
