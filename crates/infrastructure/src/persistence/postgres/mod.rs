//! PostgreSQL persistence adapters.

mod attempt_repository;
mod batch_repository;
mod metrics_repository;
mod migrations;
mod notification_repository;
mod pool;

pub use attempt_repository::PostgresDeliveryAttemptRepository;
pub use batch_repository::PostgresBatchRepository;
pub use metrics_repository::PostgresMetricsRepository;
pub use migrations::run_migrations;
pub use notification_repository::PostgresNotificationRepository;
pub use pool::{connect, DatabaseConfig};
