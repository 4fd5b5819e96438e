use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults::*;
use crate::model::{DurationHours, RequestShape, ScaleLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the BI server, e.g. `https://redash.example.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `Authorization: Key <api_key>`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(default)]
    pub scaleout: ScaleoutConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleoutConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_shape")]
    pub shape: RequestShape,
    /// Ask for confirmation before submitting.
    #[serde(default = "default_confirm")]
    pub confirm: bool,
    /// Zero means: notify and close immediately instead of showing a success panel.
    #[serde(default = "default_success_close_delay", with = "humantime_serde")]
    pub success_close_delay: Duration,
    #[serde(default)]
    pub success_panel_closable: bool,
    #[serde(default = "default_level")]
    pub default_level: ScaleLevel,
    #[serde(default = "default_size")]
    pub default_size: u32,
    #[serde(default = "default_min_size")]
    pub min_size: u32,
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    #[serde(default = "default_duration")]
    pub default_duration: DurationHours,
    #[serde(default = "default_allowed_durations")]
    pub allowed_durations: Vec<DurationHours>,
}

/// Constants of the query cost estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_price_per_tb_usd")]
    pub price_per_tb_usd: f64,
    #[serde(default = "default_overhead_multiplier")]
    pub overhead_multiplier: f64,
    /// Units of the secondary currency per USD.
    #[serde(default = "default_secondary_rate")]
    pub secondary_rate: f64,
    #[serde(default = "default_secondary_currency")]
    pub secondary_currency: String,
    #[serde(default = "default_secondary_symbol")]
    pub secondary_symbol: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Engine named in the truncation warning.
    #[serde(default = "default_truncation_source")]
    pub truncation_source: String,
}
