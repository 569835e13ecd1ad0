//! HTTP webhook transport with HMAC request signing.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde_json::Value as JsonValue;
use sha2::Sha256;

use crate::error::DeliveryError;

/// Per-request timeout covering connect plus response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bytes of an error response body kept for diagnostics.
pub const MAX_CAPTURED_BODY: usize = 4096;

/// Signature header, value `sha256=<hex>`.
pub const SIGNATURE_HEADER: &str = "X-Foliant-Signature";

/// Unix-seconds timestamp the signature covers.
pub const TIMESTAMP_HEADER: &str = "X-Foliant-Timestamp";

type HmacSha256 = Hmac<Sha256>;

/// Outbound webhook client.
///
/// Signs each request with HMAC-SHA256 over `"{timestamp}.{body}"` when a
/// signing secret is configured, so receivers can verify both integrity and
/// freshness. Redirects are never followed: a redirected delivery would
/// leak the signed body to an address nobody vetted.
#[derive(Debug, Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
    endpoint: String,
    signing_secret: Option<Vec<u8>>,
}

impl WebhookSender {
    /// Build a sender for a fixed endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        signing_secret: Option<String>,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(Policy::none())
            .build()
            .map_err(|e| DeliveryError::Config(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            signing_secret: signing_secret.map(String::into_bytes),
        })
    }

    /// Endpoint this sender posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a JSON payload; `Ok` only on a 2xx response.
    pub async fn send(&self, payload: &JsonValue) -> Result<(), DeliveryError> {
        let body = serde_json::to_string(payload)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json");

        if let Some(secret) = &self.signing_secret {
            let timestamp = Utc::now().timestamp().to_string();
            let signature = sign(secret, &timestamp, &body);
            request = request
                .header(TIMESTAMP_HEADER, &timestamp)
                .header(SIGNATURE_HEADER, format!("sha256={signature}"));
        }

        let response = request.body(body).send().await.map_err(classify)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Endpoint {
            status: status.as_u16(),
            body: truncate_body(&body),
        })
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{body}"`.
#[must_use]
pub fn sign(secret: &[u8], timestamp: &str, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Keep at most `MAX_CAPTURED_BODY` bytes, cutting on a char boundary.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_CAPTURED_BODY {
        return body.to_string();
    }
    let mut end = MAX_CAPTURED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

fn classify(error: reqwest::Error) -> DeliveryError {
    if error.is_timeout() {
        DeliveryError::Timeout
    } else if error.is_connect() {
        DeliveryError::Connect(error.to_string())
    } else {
        DeliveryError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let a = sign(b"secret", "1700000000", r#"{"k":"v"}"#);
        let b = sign(b"secret", "1700000000", r#"{"k":"v"}"#);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_signature_covers_timestamp() {
        let a = sign(b"secret", "1700000000", "{}");
        let b = sign(b"secret", "1700000001", "{}");
        assert_ne!(a, b);
    }

    #[test]
    fn test_truncate_short_body_unchanged() {
        assert_eq!(truncate_body("hello"), "hello");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // A multi-byte char straddling the limit must not be split.
        let body = "a".repeat(MAX_CAPTURED_BODY - 1) + "é";
        let truncated = truncate_body(&body);
        assert!(truncated.len() <= MAX_CAPTURED_BODY);
        assert_eq!(truncated, "a".repeat(MAX_CAPTURED_BODY - 1));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(MAX_CAPTURED_BODY * 2);
        assert_eq!(truncate_body(&body).len(), MAX_CAPTURED_BODY);
    }
}
