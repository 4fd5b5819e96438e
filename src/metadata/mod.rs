//! Query execution metadata shown under the query editor.
//!
//! Pure formatting: the same snapshot, flag and `now` always give the same view.

mod cost;
mod humanize;

pub use cost::{estimate_cost, format_cost, CostEstimate};
pub use humanize::{row_count_label, runtime_label, time_ago};

use crate::config::{AppConfig, PricingConfig};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The parts of a query result the metadata line is derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResultSnapshot {
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub truncated: Option<bool>,
    #[serde(default)]
    pub runtime_seconds: Option<f64>,
    #[serde(default)]
    pub data_scanned_bytes: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub retrieved_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
struct QueryResultEnvelope {
    query_result: QueryResultWire,
}

#[derive(Debug, Deserialize)]
struct QueryResultWire {
    #[serde(default)]
    data: QueryResultData,
    #[serde(default)]
    runtime: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    retrieved_at: Option<OffsetDateTime>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResultData {
    #[serde(default)]
    rows: Vec<serde_json::Value>,
    #[serde(default)]
    truncated: Option<bool>,
    #[serde(default)]
    metadata: Option<QueryResultMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResultMetadata {
    // Some runners report a string such as "N/A" here.
    #[serde(default)]
    data_scanned: Option<serde_json::Value>,
}

impl QueryResultSnapshot {
    /// Parse the `{"query_result": {...}}` envelope returned by `/api/query_results/{id}`.
    pub fn from_envelope_json(raw: &str) -> serde_json::Result<Self> {
        let envelope: QueryResultEnvelope = serde_json::from_str(raw)?;
        let wire = envelope.query_result;
        let data_scanned_bytes = wire
            .data
            .metadata
            .and_then(|m| m.data_scanned)
            .and_then(|v| v.as_f64());
        Ok(Self {
            rows: wire.data.rows,
            truncated: wire.data.truncated,
            runtime_seconds: wire.runtime,
            data_scanned_bytes,
            retrieved_at: wire.retrieved_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMetadataView {
    pub row_count: usize,
    pub rows: String,
    pub runtime: String,
    /// Still running: `runtime` holds the running indicator.
    pub executing: bool,
    pub cost: Option<String>,
    pub cost_estimate: Option<CostEstimate>,
    pub truncation_warning: Option<String>,
    pub refreshed: String,
}

pub struct QueryMetadataFormatter {
    pricing: PricingConfig,
    truncation_source: String,
}

impl QueryMetadataFormatter {
    pub fn new(pricing: PricingConfig, truncation_source: impl Into<String>) -> Self {
        Self {
            pricing,
            truncation_source: truncation_source.into(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.pricing.clone(), cfg.metadata.truncation_source.clone())
    }

    /// Only for results explicitly flagged as truncated.
    pub fn truncation_warning(&self, snapshot: &QueryResultSnapshot) -> Option<String> {
        (snapshot.truncated == Some(true)).then(|| {
            format!(
                "Result truncated to {} rows. {} may truncate query results that are unstably large.",
                snapshot.rows.len(),
                self.truncation_source
            )
        })
    }

    pub fn format(
        &self,
        snapshot: &QueryResultSnapshot,
        executing: bool,
        now: OffsetDateTime,
    ) -> QueryMetadataView {
        let row_count = snapshot.rows.len();
        let cost_estimate = estimate_cost(snapshot.data_scanned_bytes, &self.pricing);
        QueryMetadataView {
            row_count,
            rows: row_count_label(row_count),
            runtime: runtime_label(snapshot.runtime_seconds, executing),
            executing,
            cost: cost_estimate.as_ref().map(|c| format_cost(c, &self.pricing)),
            cost_estimate,
            truncation_warning: self.truncation_warning(snapshot),
            refreshed: time_ago(snapshot.retrieved_at, now),
        }
    }
}
