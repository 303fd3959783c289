//! Worker binary: consumes the per-channel queues and drives each
//! notification to a terminal state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::EnvFilter;

use courier_application::notifications::{ProcessCommand, ProcessNotificationUseCase};
use courier_application::ports::NotificationEvent;
use courier_domain::Result;
use courier_infrastructure::cache::redis as redis_cache;
use courier_infrastructure::delivery::WebhookDeliveryClient;
use courier_infrastructure::messaging::rabbitmq::{EventHandler, RabbitMqConsumer};
use courier_infrastructure::persistence::postgres::{
    self, DatabaseConfig, PostgresDeliveryAttemptRepository, PostgresNotificationRepository,
};
use courier_server::shutdown::shutdown_token;
use courier_shared::ConfigLoader;

/// Bridges consumed events into the process use case.
struct DeliveryHandler {
    process: ProcessNotificationUseCase,
}

#[async_trait]
impl EventHandler for DeliveryHandler {
    async fn handle(&self, event: NotificationEvent) -> Result<()> {
        self.process
            .execute(ProcessCommand {
                notification_id: event.notification_id,
            })
            .await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ConfigLoader::new().load()?;

    let pool = postgres::connect(&DatabaseConfig::new(
        &config.db.dsn,
        config.db.max_connections,
    ))
    .await?;
    postgres::run_migrations(&pool).await?;

    let redis = redis_cache::connect(&config.redis.url()).await?;
    let consumer = RabbitMqConsumer::connect(&config.rabbitmq.url).await?;

    let handler = Arc::new(DeliveryHandler {
        process: ProcessNotificationUseCase::new(
            Arc::new(PostgresNotificationRepository::new(pool.clone())),
            Arc::new(PostgresDeliveryAttemptRepository::new(pool)),
            Arc::new(redis_cache::RedisRateLimiter::new(redis)),
            Arc::new(WebhookDeliveryClient::new(&config.webhook.url)),
        ),
    });

    let token = shutdown_token();
    info!(env = %config.env, "worker consuming");
    consumer.run(handler, token).await;
    info!("worker shutdown");
    Ok(())
}
