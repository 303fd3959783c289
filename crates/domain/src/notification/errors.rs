use thiserror::Error;

use super::channel::Channel;

/// Errors of the notification domain.
///
/// Infrastructure adapters wrap driver failures into
/// [`DomainError::InfrastructureError`] at the boundary so the application
/// layer only ever sees this enum.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("notification or batch not found")]
    NotFound,

    #[error("invalid channel: {value}")]
    InvalidChannel { value: String },

    #[error("invalid priority: {value}")]
    InvalidPriority { value: String },

    #[error("invalid content: {reason}")]
    InvalidContent { reason: String },

    #[error("duplicate request: idempotency key already used")]
    DuplicateRequest,

    #[error("batch size {size} outside allowed range 1..=1000")]
    BatchTooLarge { size: usize },

    #[error("notification already in terminal state")]
    AlreadyTerminal,

    #[error("rate limit exceeded for channel {channel}")]
    RateLimited { channel: Channel },

    #[error("infrastructure error: {message}")]
    InfrastructureError { message: String },
}

impl DomainError {
    /// Shorthand used by adapters when wrapping driver errors.
    pub fn infrastructure(message: impl Into<String>) -> Self {
        DomainError::InfrastructureError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
