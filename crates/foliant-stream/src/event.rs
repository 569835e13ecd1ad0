//! Events pushed to connected clients.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use foliant_core::ClientId;

/// One JSON-encoded event on the streaming channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamEvent {
    /// Event name, e.g. "connected", "heartbeat", "status_changed".
    pub event: String,
    /// Event payload.
    pub data: JsonValue,
}

impl StreamEvent {
    /// Build an event with an arbitrary name and payload.
    pub fn new(event: impl Into<String>, data: JsonValue) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Initial event written when a connection opens.
    #[must_use]
    pub fn connected(client_id: ClientId) -> Self {
        Self::new("connected", json!({ "client_id": client_id }))
    }

    /// Periodic keep-alive written to every open connection.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new("heartbeat", json!({}))
    }

    /// A resource's lifecycle status changed.
    pub fn status_changed(
        resource_type: &str,
        resource_id: impl std::fmt::Display,
        status: &str,
    ) -> Self {
        Self::new(
            "status_changed",
            json!({
                "resource_type": resource_type,
                "resource_id": resource_id.to_string(),
                "status": status,
            }),
        )
    }

    /// An assistant reply arrived for a chat exchange.
    pub fn chat_reply(
        exchange_id: impl std::fmt::Display,
        conversation_id: impl std::fmt::Display,
        reply: &str,
    ) -> Self {
        Self::new(
            "chat_reply",
            json!({
                "exchange_id": exchange_id.to_string(),
                "conversation_id": conversation_id.to_string(),
                "reply": reply,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_event_shape() {
        let client = ClientId::new();
        let event = StreamEvent::connected(client);
        assert_eq!(event.event, "connected");
        assert_eq!(event.data["client_id"], json!(client));
    }

    #[test]
    fn test_status_changed_serializes_ids_as_strings() {
        let event = StreamEvent::status_changed("document", "abc-123", "ready");
        assert_eq!(event.data["resource_id"], "abc-123");
        assert_eq!(event.data["status"], "ready");
    }
}
