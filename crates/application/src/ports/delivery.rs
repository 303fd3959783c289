use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request body sent to the delivery sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub to: String,
    pub channel: String,
    pub content: String,
}

/// Optional response decoded from the delivery sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryResponse {
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
}

/// A failed delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveryError {
    /// HTTP status of the sink response; 0 when the request never completed.
    pub status_code: u16,
    pub message: String,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DeliveryError {}

/// Client for the external delivery sink.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Perform one delivery. Success carries the decoded response and the
    /// HTTP status (200 or 202); failure carries the status (0 on transport
    /// errors) and a message.
    async fn deliver(
        &self,
        request: &DeliveryRequest,
    ) -> std::result::Result<(DeliveryResponse, u16), DeliveryError>;
}
