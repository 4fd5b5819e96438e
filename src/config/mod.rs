//! Configuration loaded from `config.toml`.
//!
//! Every key is optional; missing keys fall back to the defaults in `defaults.rs`.

mod defaults;
mod io;
mod schema;
mod validate;

pub use io::load_or_default;
pub use schema::{AppConfig, PricingConfig, ScaleoutConfig};
