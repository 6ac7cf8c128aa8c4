//! Aggregate, comparison and answer types

use serde::Serialize;

use crate::services::period::PeriodKey;
use crate::types::BillingRecord;

/// A (dimension, summed total) pair
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateRow {
    pub label: String,
    pub total: f64,
}

/// Total for one period label; `key` is None when the label does not parse
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeriodTotal {
    pub period: String,
    #[serde(skip)]
    pub key: Option<PeriodKey>,
    pub total: f64,
}

impl PeriodTotal {
    pub fn new(period: impl Into<String>, total: f64) -> Self {
        let period = period.into();
        let key = PeriodKey::parse(&period);
        Self { period, key, total }
    }
}

/// Month-over-month comparison between the two most recent periods
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonResult {
    pub current_period: String,
    pub current_total: f64,
    pub previous_period: String,
    pub previous_total: f64,
    pub absolute_variation: f64,
    /// 0 when the previous total is exactly 0
    pub relative_variation: f64,
}

/// One client of the latest-period ranking
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClientVariation {
    pub client: String,
    pub total: f64,
    /// 0 when the client has no billing in the previous period
    pub previous_total: f64,
    pub relative_variation: f64,
}

/// Top clients of the latest resolvable period
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LatestPeriodRanking {
    pub current_period: String,
    pub previous_period: Option<String>,
    pub rows: Vec<ClientVariation>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmitterVariation {
    pub emitter: String,
    pub comparison: ComparisonResult,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceVariation {
    pub category: String,
    pub comparison: ComparisonResult,
}

/// Dataset-wide figures
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct DatasetTotals {
    pub row_count: usize,
    pub grand_total: f64,
    pub distinct_clients: usize,
}

/// Fallback answer when no intent matches
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasetSummary {
    #[serde(rename = "filas")]
    pub rows: usize,
    /// Grand total, currency formatted
    pub total: String,
    #[serde(rename = "clientes_unicos")]
    pub distinct_clients: usize,
    pub loaded_at: String,
}

/// Health view of the published snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    pub ok: bool,
    pub file: String,
    pub rows: usize,
    pub loaded_at: String,
    pub version: u64,
}

/// Column listing and a short preview of the published snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetaReport {
    pub columns: Vec<String>,
    pub rows: usize,
    pub preview: Vec<BillingRecord>,
    pub loaded_at: String,
}

/// Response to a prompt
///
/// Explanatory messages (no data, client not found) travel as `Table` text
/// so every answer has the same shape.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Answer {
    Table { md: String },
    Summary { answer: DatasetSummary },
}

impl Answer {
    pub fn table(title: &str, table: &str) -> Self {
        Self::Table {
            md: format!("{}\n{}", title, table),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::Table { md: text.into() }
    }

    /// Table text, if this answer is not the structured summary
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Table { md } => Some(md),
            Self::Summary { .. } => None,
        }
    }
}
