//! API server binary: HTTP admission, queries, cancellation, health.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use courier_application::notifications::{
    CancelNotificationUseCase, CreateNotificationUseCase, NotificationQueries,
};
use courier_infrastructure::cache::redis as redis_cache;
use courier_infrastructure::health::DependencyProbe;
use courier_infrastructure::messaging::rabbitmq::{ManagementClient, RabbitMqPublisher};
use courier_infrastructure::persistence::postgres::{
    self, DatabaseConfig, PostgresBatchRepository, PostgresMetricsRepository,
    PostgresNotificationRepository,
};
use courier_server::routes;
use courier_server::shutdown::shutdown_token;
use courier_server::state::AppState;
use courier_shared::ConfigLoader;

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
    info!("database ready");

    let redis = redis_cache::connect(&config.redis.url()).await?;
    let publisher = Arc::new(RabbitMqPublisher::connect(&config.rabbitmq.url).await?);

    let notifications = Arc::new(PostgresNotificationRepository::new(pool.clone()));
    let batches = Arc::new(PostgresBatchRepository::new(pool.clone()));
    let idempotency = Arc::new(redis_cache::RedisIdempotencyStore::new(redis.clone()));

    let state = AppState {
        create: Arc::new(CreateNotificationUseCase::new(
            notifications.clone(),
            batches.clone(),
            publisher.clone(),
            idempotency,
        )),
        cancel: Arc::new(CancelNotificationUseCase::new(notifications.clone())),
        queries: Arc::new(NotificationQueries::new(notifications, batches)),
        metrics: Arc::new(PostgresMetricsRepository::new(pool.clone())),
        probe: Some(DependencyProbe::new(pool, redis)),
        management: Some(ManagementClient::new(
            &config.rabbitmq.management_url,
            &config.rabbitmq.management_user,
            &config.rabbitmq.management_pass,
        )),
    };

    let app = routes::app(state);
    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", config.app.port)).await?;
    info!(port = config.app.port, env = %config.env, "api listening");

    let token = shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(token.cancelled_owned())
        .await?;

    publisher.close().await;
    info!("api shutdown");
    Ok(())
}
