//! TOML configuration loading
//!
//! ```toml
//! [servo]
//! address = 0
//! microsteps = 16
//! max_current_ma = 1200
//! enable_mode = "always-on"
//!
//! [link]
//! timeout_ms = 500
//! ```
//!
//! Both tables are optional and missing keys take their defaults. The
//! parsed result is validated before it is returned.

use super::types::{ConfigError, Servo42cConfig};

/// Parse and validate a configuration document
pub fn parse_config(input: &str) -> Result<Servo42cConfig, ConfigError> {
    let config: Servo42cConfig = ::toml::from_str(input).map_err(|_| ConfigError::Toml)?;
    config.validate()?;
    Ok(config)
}
