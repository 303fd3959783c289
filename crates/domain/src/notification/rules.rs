//! Content and batch limits.

use super::channel::Channel;
use super::errors::{DomainError, Result};

pub const MAX_CONTENT_LENGTH_SMS: usize = 1600;
pub const MAX_CONTENT_LENGTH_EMAIL: usize = 100_000;
pub const MAX_CONTENT_LENGTH_PUSH: usize = 4096;
pub const MAX_RECIPIENT_LENGTH: usize = 512;
pub const MAX_BATCH_SIZE: usize = 1000;

/// Maximum content length in bytes for the channel.
pub fn max_content_length(channel: Channel) -> usize {
    match channel {
        Channel::Sms => MAX_CONTENT_LENGTH_SMS,
        Channel::Email => MAX_CONTENT_LENGTH_EMAIL,
        Channel::Push => MAX_CONTENT_LENGTH_PUSH,
    }
}

/// Content must be nonempty and within the channel's byte limit.
pub fn validate_content(channel: Channel, content: &str) -> Result<()> {
    if content.is_empty() {
        return Err(DomainError::InvalidContent {
            reason: "content is required".to_string(),
        });
    }
    let max = max_content_length(channel);
    if content.len() > max {
        return Err(DomainError::InvalidContent {
            reason: format!("content exceeds {max} bytes for channel {channel}"),
        });
    }
    Ok(())
}

/// Recipient must be nonempty and at most [`MAX_RECIPIENT_LENGTH`] bytes.
pub fn validate_recipient(recipient: &str) -> Result<()> {
    if recipient.is_empty() || recipient.len() > MAX_RECIPIENT_LENGTH {
        return Err(DomainError::InvalidContent {
            reason: "recipient is required and limited to 512 bytes".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_channel_limits() {
        assert_eq!(max_content_length(Channel::Sms), 1600);
        assert_eq!(max_content_length(Channel::Email), 100_000);
        assert_eq!(max_content_length(Channel::Push), 4096);
    }

    #[test]
    fn content_bounds_are_enforced() {
        assert!(validate_content(Channel::Sms, "hi").is_ok());
        assert!(validate_content(Channel::Sms, "").is_err());
        assert!(validate_content(Channel::Sms, &"x".repeat(1600)).is_ok());
        assert!(validate_content(Channel::Sms, &"x".repeat(1601)).is_err());
        assert!(validate_content(Channel::Push, &"x".repeat(4097)).is_err());
    }

    #[test]
    fn recipient_bounds_are_enforced() {
        assert!(validate_recipient("+905551234567").is_ok());
        assert!(validate_recipient("").is_err());
        assert!(validate_recipient(&"a".repeat(512)).is_ok());
        assert!(validate_recipient(&"a".repeat(513)).is_err());
    }
}
