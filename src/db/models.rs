use serde::Serialize;
use sqlx::FromRow;

use crate::observation::{Confidence, PeriodKind};

// Database entity models
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Observation {
    pub id: i64,
    pub variable_id: String,
    pub region_code: String,
    pub year: i32,
    pub period_kind: PeriodKind,
    pub value: f64,
    pub original_value: Option<f64>,
    pub original_unit: Option<String>,
    pub confidence: Confidence,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProvenanceEntry {
    pub id: i64,
    pub observation_id: i64,
    pub source_name: String,
    pub source_type: String,
    pub source_url: Option<String>,
    pub source_page: Option<String>,
    pub extraction_method: String,
    pub extraction_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VariableDefinition {
    pub variable_id: String,
    pub category: String,
    pub variable_name: String,
    pub unit: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RegionRow {
    pub region_code: String,
    pub region_name: String,
}

/// One line of the flat export: an observation joined with its variable and region
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExportRow {
    pub year: i32,
    pub year_type: PeriodKind,
    pub region_name: String,
    pub region_code: String,
    pub category: String,
    pub variable_id: String,
    pub variable_name: String,
    pub value: f64,
    pub unit: String,
    pub confidence: Confidence,
    pub original_value: Option<f64>,
    pub original_unit: Option<String>,
    pub notes: Option<String>,
}

/// Observation count and year span for one group
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub total: i64,
    pub by_category: Vec<GroupCount>,
    pub by_variable: Vec<GroupCount>,
    pub by_region: Vec<GroupCount>,
    pub by_confidence: Vec<GroupCount>,
}

/// Outcome of a batch upsert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    pub written: usize,
    pub failed: usize,
}

/// Filter for observation queries. Year bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub variable_id: Option<String>,
    pub region: Option<String>,
    pub period_kind: Option<PeriodKind>,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
}

impl ObservationFilter {
    pub fn variable(variable_id: impl Into<String>) -> Self {
        Self {
            variable_id: Some(variable_id.into()),
            ..Default::default()
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn period_kind(mut self, period_kind: PeriodKind) -> Self {
        self.period_kind = Some(period_kind);
        self
    }

    pub fn years(mut self, from_year: Option<i32>, to_year: Option<i32>) -> Self {
        self.from_year = from_year;
        self.to_year = to_year;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}
