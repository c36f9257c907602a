use serde::{Deserialize, Serialize};
use std::fmt;

/// Year semantics of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum PeriodKind {
    /// July to June, labelled by its start year
    #[serde(rename = "FY")]
    #[sqlx(rename = "FY")]
    FiscalYear,
    #[serde(rename = "CY")]
    #[sqlx(rename = "CY")]
    CalendarYear,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::FiscalYear => "FY",
            PeriodKind::CalendarYear => "CY",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (variable, region, year, period kind) tuple identifying one stored fact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub variable_id: String,
    pub region: String,
    pub year: i32,
    pub period_kind: PeriodKind,
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {}",
            self.variable_id, self.region, self.year, self.period_kind
        )
    }
}

/// A normalized observation as emitted by an extractor, before it is stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    pub variable_id: String,
    pub region: String,
    pub year: i32,
    pub period_kind: PeriodKind,
    /// Value in the variable's canonical unit; `None` when conversion produced nothing
    pub value: Option<f64>,
    pub original_value: Option<f64>,
    pub original_unit: Option<String>,
    pub confidence: Confidence,
    pub notes: Option<String>,
    /// Worksheet the value was read from
    #[serde(skip)]
    pub source_page: Option<String>,
}

impl ObservationRecord {
    pub fn key(&self) -> NaturalKey {
        NaturalKey {
            variable_id: self.variable_id.clone(),
            region: self.region.clone(),
            year: self.year,
            period_kind: self.period_kind,
        }
    }
}
