//! Courier domain model.
//!
//! Entities, enumerations, and validation rules for the notification
//! delivery pipeline. This crate has no I/O; everything observable about a
//! notification's lifecycle is expressed here and enforced by the
//! application layer through repository operations.

pub mod ids;
pub mod notification;

pub use ids::{AttemptId, BatchId, NotificationId};
pub use notification::{
    Batch, Channel, DeliveryAttempt, DomainError, Notification, Priority, Result, Status,
};
