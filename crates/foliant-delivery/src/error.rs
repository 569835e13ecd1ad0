//! Delivery error types.

use foliant_events::EventError;
use thiserror::Error;

/// Errors from outbound publishing and retry processing.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The webhook endpoint answered with a non-2xx status.
    #[error("Webhook endpoint returned HTTP {status}")]
    Endpoint {
        status: u16,
        /// Response body, truncated to a bounded prefix.
        body: String,
    },

    /// The webhook request hit the client timeout.
    #[error("Webhook request timed out")]
    Timeout,

    /// TCP/TLS connection to the endpoint could not be established.
    #[error("Failed to connect to webhook endpoint: {0}")]
    Connect(String),

    /// Any other transport-level request failure.
    #[error("Webhook request failed: {0}")]
    Request(String),

    /// The outbound payload could not be serialized.
    #[error("Failed to serialize outbound payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error while recording delivery state.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Queue transport publish failure.
    #[error(transparent)]
    Queue(#[from] EventError),

    /// The configured transport mode needs a queue producer that is absent.
    #[error("Transport mode '{0}' requires a configured queue producer")]
    QueueUnavailable(String),

    /// Unrecognized transport mode string.
    #[error("Invalid transport mode: {0} (expected webhook, queue, or hybrid)")]
    InvalidTransportMode(String),

    /// Webhook client could not be constructed.
    #[error("Invalid webhook configuration: {0}")]
    Config(String),
}

impl DeliveryError {
    /// True when a later attempt against the same endpoint could succeed.
    ///
    /// Endpoint errors count as retryable regardless of status class: a
    /// processor returning 4xx during a bad deploy recovers just like a 5xx.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Endpoint { .. }
                | DeliveryError::Timeout
                | DeliveryError::Connect(_)
                | DeliveryError::Request(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failures_are_retryable() {
        assert!(DeliveryError::Timeout.is_retryable());
        assert!(DeliveryError::Connect("refused".into()).is_retryable());
        assert!(DeliveryError::Endpoint {
            status: 503,
            body: String::new(),
        }
        .is_retryable());
        assert!(DeliveryError::Endpoint {
            status: 404,
            body: String::new(),
        }
        .is_retryable());
    }

    #[test]
    fn test_local_failures_are_not_retryable() {
        assert!(!DeliveryError::QueueUnavailable("hybrid".into()).is_retryable());
        assert!(!DeliveryError::InvalidTransportMode("smtp".into()).is_retryable());
    }
}
