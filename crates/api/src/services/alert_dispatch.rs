//! Alert dispatchers.
//!
//! Two implementations of the engine's dispatcher seam: a console
//! dispatcher that writes alerts to the service log, and a webhook
//! dispatcher that posts signed JSON payloads to an external receiver.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use metrics::counter;
use reqwest::Client;
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, warn};

use domain::models::AlertEvent;
use domain::services::{AlertDispatcher, DispatchResult};

/// Writes alerts to the service log. The default dispatch mode.
pub struct ConsoleAlertDispatcher;

#[async_trait]
impl AlertDispatcher for ConsoleAlertDispatcher {
    async fn dispatch(&self, event: &AlertEvent) -> DispatchResult {
        info!(
            alert_id = %event.id,
            entity_id = %event.entity_id,
            kind = %event.kind,
            severity = %event.severity,
            message = %event.message,
            "ALERT"
        );
        DispatchResult::Delivered
    }
}

/// Posts alerts to an external webhook receiver.
///
/// Payloads are the alert event serialized as JSON. When a secret is
/// configured, each request carries an `X-Alert-Signature` header with
/// an HMAC-SHA256 signature over the raw body.
pub struct WebhookAlertDispatcher {
    client: Client,
    target_url: String,
    secret: String,
}

impl WebhookAlertDispatcher {
    pub fn new(target_url: String, secret: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            target_url,
            secret,
        }
    }

    /// Sign the payload with HMAC-SHA256.
    fn sign_payload(&self, payload: &str) -> Result<String, String> {
        type HmacSha256 = Hmac<Sha256>;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| format!("HMAC signing error: {}", e))?;

        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("sha256={}", signature))
    }
}

#[async_trait]
impl AlertDispatcher for WebhookAlertDispatcher {
    async fn dispatch(&self, event: &AlertEvent) -> DispatchResult {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => return DispatchResult::Failed(format!("Serialization error: {}", e)),
        };

        let mut request = self
            .client
            .post(&self.target_url)
            .header("Content-Type", "application/json");

        if !self.secret.is_empty() {
            let signature = match self.sign_payload(&payload) {
                Ok(signature) => signature,
                Err(e) => return DispatchResult::Failed(e),
            };
            request = request.header("X-Alert-Signature", signature);
        }

        match request.body(payload).send().await {
            Ok(response) if response.status().is_success() => {
                counter!("alert_webhook_deliveries_total", "outcome" => "delivered").increment(1);
                DispatchResult::Delivered
            }
            Ok(response) => {
                let status = response.status().as_u16();
                counter!("alert_webhook_deliveries_total", "outcome" => "rejected").increment(1);
                warn!(
                    alert_id = %event.id,
                    status = status,
                    "Webhook receiver rejected alert"
                );
                DispatchResult::Failed(format!("Webhook returned status {}", status))
            }
            Err(e) => {
                counter!("alert_webhook_deliveries_total", "outcome" => "error").increment(1);
                warn!(alert_id = %event.id, error = %e, "Webhook delivery failed");
                DispatchResult::Failed(format!("HTTP request failed: {}", e))
            }
        }
    }
}
