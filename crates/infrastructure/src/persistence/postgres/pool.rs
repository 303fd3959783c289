use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use courier_domain::{DomainError, Result};

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub dsn: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(dsn: impl Into<String>, max_connections: u32) -> Self {
        Self {
            dsn: dsn.into(),
            max_connections,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a connection pool against PostgreSQL.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.dsn)
        .await
        .map_err(|e| DomainError::infrastructure(format!("failed to connect to database: {e}")))
}
