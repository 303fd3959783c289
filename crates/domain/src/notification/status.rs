use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a notification.
///
/// Transitions: `pending → queued → sent | failed`, with `cancelled`
/// reachable from `pending` and `queued`. `sent`, `failed`, and `cancelled`
/// are sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Created, not yet published to the broker.
    Pending,
    /// Published to the broker, awaiting delivery.
    Queued,
    /// Delivered successfully.
    Sent,
    /// Delivery exhausted its retry budget.
    Failed,
    /// Cancelled before or during processing.
    Cancelled,
}

impl Status {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Status::Pending),
            "queued" => Some(Status::Queued),
            "sent" => Some(Status::Sent),
            "failed" => Some(Status::Failed),
            "cancelled" => Some(Status::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Queued => "queued",
            Status::Sent => "sent",
            Status::Failed => "failed",
            Status::Cancelled => "cancelled",
        }
    }

    /// True when no further processing may occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Sent | Status::Failed | Status::Cancelled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
