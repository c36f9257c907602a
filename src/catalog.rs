//! Static reference data: regions, variable definitions, sources and download targets.

/// A geographic scope of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
    /// Label used for the region in ABS region-per-row tables
    pub source_label: &'static str,
}

pub const NATIONAL: &str = "AUS";

pub const REGIONS: &[Region] = &[
    Region { code: "NSW", name: "New South Wales", source_label: "New South Wales" },
    Region { code: "VIC", name: "Victoria", source_label: "Victoria" },
    Region { code: "QLD", name: "Queensland", source_label: "Queensland" },
    Region { code: "SA", name: "South Australia", source_label: "South Australia" },
    Region { code: "WA", name: "Western Australia", source_label: "Western Australia" },
    Region { code: "TAS", name: "Tasmania", source_label: "Tasmania" },
    Region { code: "NT", name: "Northern Territory", source_label: "Northern Territory" },
    Region {
        code: "ACT",
        name: "Australian Capital Territory",
        source_label: "Australian Capital Territory",
    },
    Region { code: NATIONAL, name: "Australia (National)", source_label: "Australia" },
];

/// Map a region label as printed in a source table to its code
///
/// Only exact labels map; sub-regional and footnote rows return `None`.
pub fn region_code_for_label(label: &str) -> Option<&'static str> {
    let label = label.trim();
    REGIONS
        .iter()
        .find(|region| region.source_label == label)
        .map(|region| region.code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpec {
    pub id: &'static str,
    pub category: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
}

pub const VARIABLES: &[VariableSpec] = &[
    // Production
    VariableSpec {
        id: "prod_milk_total",
        category: "production",
        name: "Total milk production",
        unit: "megalitres",
        description: "Total whole milk production",
    },
    VariableSpec {
        id: "prod_butter",
        category: "production",
        name: "Butter production",
        unit: "tonnes",
        description: "Factory butter production",
    },
    VariableSpec {
        id: "prod_cheese",
        category: "production",
        name: "Cheese production",
        unit: "tonnes",
        description: "Factory cheese production",
    },
    VariableSpec {
        id: "prod_milk_powder",
        category: "production",
        name: "Milk powder production",
        unit: "tonnes",
        description: "Whole milk powder production",
    },
    // Prices
    VariableSpec {
        id: "price_farmgate_market",
        category: "price",
        name: "Farmgate price - market milk",
        unit: "cents_per_litre",
        description: "Price paid to farmers for market/liquid milk",
    },
    VariableSpec {
        id: "price_farmgate_manufacturing",
        category: "price",
        name: "Farmgate price - manufacturing milk",
        unit: "cents_per_litre",
        description: "Price paid to farmers for manufacturing milk",
    },
    VariableSpec {
        id: "price_farmgate_avg",
        category: "price",
        name: "Average farmgate price",
        unit: "cents_per_litre",
        description: "Weighted average farmgate milk price",
    },
    VariableSpec {
        id: "price_export_butter",
        category: "price",
        name: "Export butter price",
        unit: "cents_per_kg",
        description: "Average export price for butter",
    },
    VariableSpec {
        id: "price_export_cheese",
        category: "price",
        name: "Export cheese price",
        unit: "cents_per_kg",
        description: "Average export price for cheese",
    },
    // Herd
    VariableSpec {
        id: "herd_dairy_cows",
        category: "herd",
        name: "Dairy cow numbers",
        unit: "head",
        description: "Cows in milk and dry",
    },
    VariableSpec {
        id: "herd_dairy_cattle",
        category: "herd",
        name: "Dairy cattle numbers",
        unit: "head",
        description: "Total dairy cattle",
    },
    VariableSpec {
        id: "herd_total_cattle",
        category: "herd",
        name: "Total cattle numbers",
        unit: "head",
        description: "Total cattle (meat + dairy)",
    },
    VariableSpec {
        id: "herd_yield_per_cow",
        category: "herd",
        name: "Yield per cow",
        unit: "litres",
        description: "Average annual milk yield per cow",
    },
    // Consumption
    VariableSpec {
        id: "cons_butter_percap",
        category: "consumption",
        name: "Per capita butter consumption",
        unit: "kg",
        description: "Annual per capita butter consumption",
    },
    VariableSpec {
        id: "cons_cheese_percap",
        category: "consumption",
        name: "Per capita cheese consumption",
        unit: "kg",
        description: "Annual per capita cheese consumption",
    },
    VariableSpec {
        id: "cons_milk_percap",
        category: "consumption",
        name: "Per capita milk consumption",
        unit: "litres",
        description: "Annual per capita fluid milk consumption",
    },
    VariableSpec {
        id: "cons_milk_total",
        category: "consumption",
        name: "Total domestic milk consumption",
        unit: "megalitres",
        description: "Total domestic fluid/market milk sales",
    },
];

pub fn variable(id: &str) -> Option<&'static VariableSpec> {
    VARIABLES.iter().find(|v| v.id == id)
}

/// Document descriptor recorded in provenance for every observation a source yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: &'static str,
    pub source_type: &'static str,
    pub url: &'static str,
}

/// Which publisher a download target belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publisher {
    Abares,
    Abs,
}

impl Publisher {
    /// Raw-data subdirectory for the publisher's files
    pub fn subdir(&self) -> &'static str {
        match self {
            Publisher::Abares => "abares",
            Publisher::Abs => "abs",
        }
    }
}

/// A workbook published at a fixed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadTarget {
    pub name: &'static str,
    pub url: &'static str,
    pub publisher: Publisher,
}

impl DownloadTarget {
    /// Local file name, `<name>.<extension of the URL>`
    pub fn file_name(&self) -> String {
        let path = self.url.split(['?', '#']).next().unwrap_or(self.url);
        let ext = path
            .rsplit('/')
            .next()
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .unwrap_or("xlsx");
        format!("{}.{}", self.name, ext)
    }
}

pub const DOWNLOAD_TARGETS: &[DownloadTarget] = &[
    DownloadTarget {
        name: "acs2017_dairy",
        url: "http://data.daff.gov.au/data/warehouse/agcstd9abcc002/agcstd9abcc0022017_IugZg/ACS2017_DairyTables_v1.0.0.xlsx",
        publisher: Publisher::Abares,
    },
    DownloadTarget {
        name: "outlook_data_2024",
        url: "https://www.agriculture.gov.au/sites/default/files/documents/agricultural-outlook-march-2024-data-tables.xlsx",
        publisher: Publisher::Abares,
    },
    DownloadTarget {
        name: "outlook_data_2025",
        url: "https://www.agriculture.gov.au/sites/default/files/documents/agricultural-outlook-march-2025-data-tables.xlsx",
        publisher: Publisher::Abares,
    },
    DownloadTarget {
        name: "livestock_products_dec2025",
        url: "https://www.abs.gov.au/statistics/industry/agriculture/livestock-products-australia/latest-release/72150DO002_202512.xlsx",
        publisher: Publisher::Abs,
    },
    DownloadTarget {
        name: "livestock_products_sep2025",
        url: "https://www.abs.gov.au/statistics/industry/agriculture/livestock-products-australia/sep-2025/72150DO002_202509.xlsx",
        publisher: Publisher::Abs,
    },
    DownloadTarget {
        name: "ag_commodities_2021_22",
        url: "https://www.abs.gov.au/statistics/industry/agriculture/agricultural-commodities-australia/2021-22/71210DO001_202122.xlsx",
        publisher: Publisher::Abs,
    },
    DownloadTarget {
        name: "ag_livestock_2023_24",
        url: "https://www.abs.gov.au/statistics/industry/agriculture/australian-agriculture-livestock/2023-24/71870DO001_202324.xlsx",
        publisher: Publisher::Abs,
    },
];

/// Keywords that mark an ABS dataflow as relevant to dairy
pub const ABS_DATAFLOW_KEYWORDS: &[&str] = &["agri", "livestock", "dairy", "milk", "farm", "cattle"];
