use std::time::Duration;

use super::schema::{AppConfig, MetadataConfig, PricingConfig, ScaleoutConfig};
use crate::model::{DurationHours, RequestShape, ScaleLevel};

pub(super) fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

pub(super) fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

pub(super) fn default_endpoint() -> String {
    "/api/trino/scaleout".to_string()
}

pub(super) fn default_shape() -> RequestShape {
    RequestShape::Level
}

pub(super) fn default_confirm() -> bool {
    true
}

pub(super) fn default_success_close_delay() -> Duration {
    Duration::from_millis(3000)
}

pub(super) fn default_level() -> ScaleLevel {
    ScaleLevel::Standard
}

pub(super) fn default_size() -> u32 {
    20
}

pub(super) fn default_min_size() -> u32 {
    1
}

pub(super) fn default_max_size() -> u32 {
    100
}

pub(super) fn default_duration() -> DurationHours {
    DurationHours::from_minutes(120)
}

pub(super) fn default_allowed_durations() -> Vec<DurationHours> {
    [10, 30, 60, 120, 240, 480, 1440]
        .into_iter()
        .map(DurationHours::from_minutes)
        .collect()
}

pub(super) fn default_price_per_tb_usd() -> f64 {
    5.0
}

pub(super) fn default_overhead_multiplier() -> f64 {
    1.1
}

pub(super) fn default_secondary_rate() -> f64 {
    1400.0
}

pub(super) fn default_secondary_currency() -> String {
    "KRW".to_string()
}

pub(super) fn default_secondary_symbol() -> String {
    "₩".to_string()
}

pub(super) fn default_locale() -> String {
    "ko-KR".to_string()
}

pub(super) fn default_truncation_source() -> String {
    "Databricks".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout: default_request_timeout(),
            scaleout: ScaleoutConfig::default(),
            pricing: PricingConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl Default for ScaleoutConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            shape: default_shape(),
            confirm: default_confirm(),
            success_close_delay: default_success_close_delay(),
            success_panel_closable: false,
            default_level: default_level(),
            default_size: default_size(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            default_duration: default_duration(),
            allowed_durations: default_allowed_durations(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_per_tb_usd: default_price_per_tb_usd(),
            overhead_multiplier: default_overhead_multiplier(),
            secondary_rate: default_secondary_rate(),
            secondary_currency: default_secondary_currency(),
            secondary_symbol: default_secondary_symbol(),
            locale: default_locale(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            truncation_source: default_truncation_source(),
        }
    }
}
