use std::path::PathBuf;

use tracing::info;

use super::dto::Config;
use super::error::Result;

/// Configuration loader.
///
/// Loads an optional `.env.<APP_ENV>` file and then reads the process
/// environment. Values already present in the environment win over the file,
/// so container deployments can ignore the overlay entirely.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Directory the `.env.<env>` file is searched in (default: cwd).
    base_dir: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Load the service configuration.
    pub fn load(&self) -> Result<Config> {
        let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());

        let mut env_file = self.base_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        env_file.push(format!(".env.{env_name}"));

        match dotenv::from_path(&env_file) {
            Ok(()) => info!(path = %env_file.display(), "loaded env file"),
            Err(_) => info!(
                path = %env_file.display(),
                "env file not found, using system environment"
            ),
        }

        let config = Config::from_env()?;
        info!(env = %config.env, port = config.app.port, "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable tests mutate process state; keep them in one
    // test so they cannot race each other.
    #[test]
    fn load_reads_required_and_defaulted_values() {
        std::env::set_var("APP_ENV", "test");
        std::env::set_var("APP_PORT", "8080");
        std::env::set_var("DB_DSN", "postgres://localhost/courier_test");
        std::env::remove_var("REDIS_ADDR");

        let config = ConfigLoader::new().load().expect("config should load");

        assert_eq!(config.env, "test");
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.db.dsn, "postgres://localhost/courier_test");
        assert_eq!(config.redis.addr, "localhost:6379");
        assert_eq!(config.redis.url(), "redis://localhost:6379");
        assert!(config.rabbitmq.url.starts_with("amqp://"));

        std::env::remove_var("APP_PORT");
        let err = ConfigLoader::new().load().unwrap_err();
        assert!(matches!(
            err,
            crate::config::ConfigError::MissingRequired { name: "APP_PORT" }
        ));

        std::env::set_var("APP_PORT", "not-a-port");
        let err = ConfigLoader::new().load().unwrap_err();
        assert!(matches!(
            err,
            crate::config::ConfigError::InvalidValue { name: "APP_PORT", .. }
        ));
    }
}
