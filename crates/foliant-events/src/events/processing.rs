//! Processing-request events consumed by the external AI service.

use crate::event::Event;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document was accepted for processing.
///
/// Mirrors the webhook-leg payload: the consumer downloads the raw content
/// and posts artifacts back to the callback URLs using the resource token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSubmitted {
    pub document_id: Uuid,
    pub filename: String,
    pub content_type: String,
    /// Where the consumer fetches the raw bytes.
    pub download_url: String,
    /// Callback URL for the processed markdown artifact.
    pub markdown_callback_url: String,
    /// Callback URL for the vector batch artifact.
    pub vectors_callback_url: String,
    /// Resource-scoped token authorizing both callbacks.
    pub callback_token: String,
}

impl Event for DocumentSubmitted {
    const TOPIC: &'static str = "foliant.ingest.document.submitted";
    const EVENT_TYPE: &'static str = "foliant.ingest.document.submitted";
}

/// A chat message was accepted for processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageSubmitted {
    pub exchange_id: Uuid,
    pub conversation_id: Uuid,
    /// The user's message, inlined (no download step for chat).
    pub message: String,
    /// Callback URL for the assistant reply.
    pub reply_callback_url: String,
    /// Resource-scoped token authorizing the callback.
    pub callback_token: String,
}

impl Event for ChatMessageSubmitted {
    const TOPIC: &'static str = "foliant.ingest.chat.submitted";
    const EVENT_TYPE: &'static str = "foliant.ingest.chat.submitted";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EventEnvelope;

    #[test]
    fn test_document_event_envelope_roundtrip() {
        let tenant = Uuid::new_v4();
        let event = DocumentSubmitted {
            document_id: Uuid::new_v4(),
            filename: "report.pdf".into(),
            content_type: "application/pdf".into(),
            download_url: "https://api.example.com/d/1/download".into(),
            markdown_callback_url: "https://api.example.com/d/1/callback".into(),
            vectors_callback_url: "https://api.example.com/v/callback/1".into(),
            callback_token: "tok".into(),
        };
        let env = EventEnvelope::new(event, tenant);
        let bytes = env.to_json_bytes().unwrap();
        let back = EventEnvelope::<DocumentSubmitted>::from_json_bytes(&bytes).unwrap();
        assert_eq!(back.tenant_id, tenant);
        assert_eq!(back.payload.filename, "report.pdf");
        assert_eq!(back.event_type, DocumentSubmitted::EVENT_TYPE);
    }
}
