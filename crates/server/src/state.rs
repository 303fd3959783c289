//! Shared application state for the Axum handlers.

use std::sync::Arc;

use courier_application::notifications::{
    CancelNotificationUseCase, CreateNotificationUseCase, NotificationQueries,
};
use courier_application::ports::MetricsProvider;
use courier_infrastructure::health::DependencyProbe;
use courier_infrastructure::messaging::rabbitmq::ManagementClient;

/// Application state shared across all route handlers via Axum `State`.
///
/// `probe` and `management` are optional so tests can wire the router with
/// in-memory ports only; without a probe the health endpoint reports ok.
#[derive(Clone)]
pub struct AppState {
    pub create: Arc<CreateNotificationUseCase>,
    pub cancel: Arc<CancelNotificationUseCase>,
    pub queries: Arc<NotificationQueries>,
    pub metrics: Arc<dyn MetricsProvider>,
    pub probe: Option<DependencyProbe>,
    pub management: Option<ManagementClient>,
}
