//! Courier infrastructure adapters.
//!
//! Production implementations of the application ports: PostgreSQL
//! persistence, Redis idempotency/rate limiting, RabbitMQ messaging, and
//! the webhook delivery client. Driver errors are wrapped into
//! `DomainError::InfrastructureError` at this boundary.

pub mod cache;
pub mod delivery;
pub mod health;
pub mod messaging;
pub mod persistence;
