//! Configuration types
//!
//! Board-agnostic configuration for one driver on one link, optionally
//! loaded from TOML text.

#[cfg(feature = "toml")]
pub mod toml;
pub mod types;

#[cfg(feature = "toml")]
pub use self::toml::parse_config;
pub use types::*;
