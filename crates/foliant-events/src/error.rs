//! Error types for the foliant-events crate.

use thiserror::Error;

/// Errors from event configuration, serialization, and publishing.
#[derive(Debug, Error)]
pub enum EventError {
    /// Required configuration variable is missing.
    #[error("Configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("Configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    /// Failed to connect to the broker.
    #[error("Connection to broker {broker} failed: {cause}")]
    ConnectionFailed { broker: String, cause: String },

    /// Failed to publish an event to a topic.
    #[error("Failed to publish to topic {topic}: {cause}")]
    PublishFailed { topic: String, cause: String },

    /// Failed to serialize an event.
    #[error("Failed to serialize event type {event_type}: {cause}")]
    SerializationFailed { event_type: String, cause: String },

    /// Failed to deserialize an event.
    #[error("Failed to deserialize event type {event_type}: {raw}")]
    DeserializationFailed { event_type: String, raw: String },

    /// Internal Kafka client error.
    #[cfg(feature = "kafka")]
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

impl EventError {
    /// True if the error is transient and the operation can be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EventError::ConnectionFailed { .. } | EventError::PublishFailed { .. }
        )
    }

    /// True for configuration errors, which are permanent.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EventError::ConfigMissing { .. } | EventError::ConfigInvalid { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(EventError::PublishFailed {
            topic: "t".into(),
            cause: "broker down".into()
        }
        .is_transient());
        assert!(!EventError::ConfigMissing { var: "X".into() }.is_transient());
    }

    #[test]
    fn test_config_error_display() {
        let err = EventError::ConfigMissing {
            var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration missing: KAFKA_BOOTSTRAP_SERVERS"
        );
    }
}
