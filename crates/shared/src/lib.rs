//! Cross-cutting pieces shared by every courier crate: configuration
//! loading and correlation identifiers.

pub mod config;
pub mod correlation;

pub use config::{Config, ConfigError, ConfigLoader};
pub use correlation::CorrelationId;
