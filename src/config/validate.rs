use thiserror::Error;

use super::schema::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(invalid(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("request_timeout must be greater than 0"));
        }

        let scaleout = &self.scaleout;
        if !scaleout.endpoint.starts_with('/') {
            return Err(invalid("scaleout.endpoint must start with '/'"));
        }
        if scaleout.allowed_durations.is_empty() {
            return Err(invalid("scaleout.allowed_durations must not be empty"));
        }
        if !scaleout
            .allowed_durations
            .contains(&scaleout.default_duration)
        {
            return Err(invalid(format!(
                "scaleout.default_duration ({}) must be one of scaleout.allowed_durations",
                scaleout.default_duration
            )));
        }
        if scaleout.min_size == 0 {
            return Err(invalid("scaleout.min_size must be greater than 0"));
        }
        if scaleout.min_size > scaleout.max_size {
            return Err(invalid("scaleout.min_size must not exceed scaleout.max_size"));
        }
        if !(scaleout.min_size..=scaleout.max_size).contains(&scaleout.default_size) {
            return Err(invalid(format!(
                "scaleout.default_size must be between {} and {}",
                scaleout.min_size, scaleout.max_size
            )));
        }

        let pricing = &self.pricing;
        if !pricing.price_per_tb_usd.is_finite() || pricing.price_per_tb_usd < 0.0 {
            return Err(invalid("pricing.price_per_tb_usd must be non-negative"));
        }
        if !pricing.overhead_multiplier.is_finite() || pricing.overhead_multiplier <= 0.0 {
            return Err(invalid("pricing.overhead_multiplier must be greater than 0"));
        }
        if !pricing.secondary_rate.is_finite() || pricing.secondary_rate <= 0.0 {
            return Err(invalid("pricing.secondary_rate must be greater than 0"));
        }
        if pricing.secondary_symbol.trim().is_empty() {
            return Err(invalid("pricing.secondary_symbol must not be empty"));
        }
        Ok(())
    }
}
