//! Event envelope carrying routing and tenant metadata.

use crate::error::EventError;
use crate::event::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every published event.
///
/// The `event_id` gives idempotent consumers a dedup key; the `tenant_id`
/// doubles as the partition key so one tenant's events stay ordered on a
/// single partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique id for this event instance.
    pub event_id: Uuid,

    /// Fully qualified event type name, e.g.
    /// "foliant.ingest.document.submitted".
    pub event_type: String,

    /// Tenant context for multi-tenant isolation.
    pub tenant_id: Uuid,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// The event payload.
    pub payload: T,
}

impl<T: Event> EventEnvelope<T> {
    /// Wrap a payload in a fresh envelope.
    pub fn new(payload: T, tenant_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: T::EVENT_TYPE.to_string(),
            tenant_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// The Kafka topic for this event.
    pub fn topic(&self) -> &'static str {
        T::TOPIC
    }

    /// Partition key: the tenant id, so per-tenant ordering holds.
    pub fn partition_key(&self) -> String {
        self.tenant_id.to_string()
    }

    /// Serialize the envelope to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationFailed {
            event_type: T::EVENT_TYPE.to_string(),
            cause: e.to_string(),
        })
    }

    /// Deserialize an envelope from JSON bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|_| EventError::DeserializationFailed {
            event_type: T::EVENT_TYPE.to_string(),
            raw: String::from_utf8_lossy(bytes).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    impl Event for Ping {
        const TOPIC: &'static str = "foliant.test.ping";
        const EVENT_TYPE: &'static str = "foliant.test.ping";
    }

    #[test]
    fn test_envelope_carries_type_and_tenant() {
        let tenant = Uuid::new_v4();
        let env = EventEnvelope::new(Ping { n: 7 }, tenant);
        assert_eq!(env.event_type, "foliant.test.ping");
        assert_eq!(env.tenant_id, tenant);
        assert_eq!(env.topic(), "foliant.test.ping");
        assert_eq!(env.partition_key(), tenant.to_string());
    }

    #[test]
    fn test_json_roundtrip() {
        let env = EventEnvelope::new(Ping { n: 42 }, Uuid::new_v4());
        let bytes = env.to_json_bytes().unwrap();
        let back = EventEnvelope::<Ping>::from_json_bytes(&bytes).unwrap();
        assert_eq!(back.event_id, env.event_id);
        assert_eq!(back.payload, Ping { n: 42 });
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = EventEnvelope::<Ping>::from_json_bytes(b"not json").unwrap_err();
        assert!(matches!(err, EventError::DeserializationFailed { .. }));
    }
}
