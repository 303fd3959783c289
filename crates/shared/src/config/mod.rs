//! Configuration module
//!
//! Typed configuration loaded from environment variables with an optional
//! `.env.<APP_ENV>` file overlay for local development.

mod dto;
mod error;
mod loader;

pub use dto::{
    AppConfig, Config, DatabaseConfig, RabbitMqConfig, RedisConfig, WebhookConfig,
};
pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;
