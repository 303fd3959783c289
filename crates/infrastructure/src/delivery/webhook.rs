//! HTTP delivery sink client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use courier_application::ports::{
    DeliveryClient, DeliveryError, DeliveryRequest, DeliveryResponse,
};

/// Per-attempt deadline; the consumer's 60 s message timeout bounds the
/// whole retry loop on top of this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Posts `{to, channel, content}` to a single configured webhook URL.
#[derive(Clone)]
pub struct WebhookDeliveryClient {
    url: String,
    client: reqwest::Client,
}

impl WebhookDeliveryClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DeliveryClient for WebhookDeliveryClient {
    async fn deliver(
        &self,
        request: &DeliveryRequest,
    ) -> Result<(DeliveryResponse, u16), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| DeliveryError {
                status_code: 0,
                message: format!("webhook request: {e}"),
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.unwrap_or_default();

        if status == 200 || status == 202 {
            let mut decoded: DeliveryResponse =
                serde_json::from_slice(&body).unwrap_or_default();
            if decoded.timestamp.is_empty() {
                decoded.timestamp = Utc::now().to_rfc3339();
            }
            Ok((decoded, status))
        } else {
            Err(DeliveryError {
                status_code: status,
                message: format!(
                    "delivery failed: status {status} body {}",
                    String::from_utf8_lossy(&body)
                ),
            })
        }
    }
}
