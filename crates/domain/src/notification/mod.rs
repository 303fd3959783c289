//! Notification bounded context: entities, enumerations, limits, errors.

mod channel;
mod entity;
mod errors;
mod priority;
pub mod rules;
mod status;

pub use channel::Channel;
pub use entity::{Batch, DeliveryAttempt, Notification};
pub use errors::{DomainError, Result};
pub use priority::Priority;
pub use status::Status;
