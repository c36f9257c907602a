//! ABS Historical Selected Agricultural Commodities, 1860 to 2022
//!
//! Region-per-row, year-per-column tables. The header row carries the
//! "Region label" and "Unit of measure" captions followed by calendar years.

use super::layout::{HeaderLocator, LayoutKind, RowSelector, TableLayout, YearBounds, YearLabel};
use super::SourceSpec;
use crate::catalog::SourceDescriptor;
use crate::conversions::Conversion;
use crate::observation::{Confidence, PeriodKind};

pub const SOURCE: SourceDescriptor = SourceDescriptor {
    name: "ABS Historical Agricultural Commodities 1860-2022",
    source_type: "abs",
    url: "https://www.abs.gov.au/statistics/industry/agriculture/agricultural-commodities-australia/latest-release",
};

pub const FILE_CANDIDATES: &[&str] = &["historic_ag_commodities_1860_2022.xlsx"];

pub const HEADER_SENTINEL: &str = "Region label";
pub const HEADER_SCAN_ROWS: usize = 10;
pub const YEAR_BOUNDS: YearBounds = YearBounds::between(1860, 2030);

const LABEL_COLUMN: usize = 0;
const FIRST_YEAR_COLUMN: usize = 2;

pub fn source() -> SourceSpec {
    SourceSpec {
        descriptor: SOURCE,
        subdir: "abs",
        file_candidates: FILE_CANDIDATES,
        tables: tables(),
        processed_name: "abs_historic_parsed.csv",
    }
}

pub fn tables() -> Vec<TableLayout> {
    vec![
        region_table("Table 8", "Dairy cattle by state", "herd_dairy_cattle"),
        region_table("Table 6", "Total cattle by state", "herd_total_cattle"),
    ]
}

fn region_table(sheet: &'static str, title: &'static str, variable_id: &'static str) -> TableLayout {
    TableLayout {
        sheet,
        title,
        period_kind: PeriodKind::CalendarYear,
        year_label: YearLabel::Integer,
        years: YEAR_BOUNDS,
        confidence: Confidence::High,
        kind: LayoutKind::Wide {
            header: HeaderLocator::Sentinel {
                label: HEADER_SENTINEL,
                scan_rows: HEADER_SCAN_ROWS,
            },
            first_year_column: FIRST_YEAR_COLUMN,
            rows: RowSelector::ByRegionLabel {
                label_column: LABEL_COLUMN,
                variable_id,
                original_unit: "head",
                conversion: Conversion::Identity,
            },
        },
    }
}
