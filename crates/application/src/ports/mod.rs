//! Ports: the application layer's view of the outside world.
//!
//! Each trait is deliberately narrow (1-4 operations) so production wiring
//! and tests can substitute implementations freely.

mod delivery;
mod idempotency;
mod metrics;
mod publisher;
mod rate_limiter;
mod repository;

pub use delivery::{DeliveryClient, DeliveryError, DeliveryRequest, DeliveryResponse};
pub use idempotency::IdempotencyStore;
pub use metrics::{MetricsProvider, NotificationStats};
pub use publisher::{EventPublisher, NotificationEvent};
pub use rate_limiter::RateLimiter;
pub use repository::{
    BatchRepository, DeliveryAttemptRepository, ListFilter, ListResult, NotificationRepository,
};
