//! Outbound processing-request payloads.
//!
//! The same JSON shape travels over both transports: webhook POST bodies and
//! Kafka event payloads. The `action` tag tells the processor what work the
//! request carries; `source` identifies the sending system.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use foliant_db::models::delivery_record::DeliveryType;

/// Value of the `source` field on every outbound request.
pub const REQUEST_SOURCE: &str = "foliant-ingest";

/// A request for the external processor, tagged by action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ProcessingRequest {
    /// Convert a document to markdown and compute vector embeddings.
    #[serde(rename = "process_document")]
    Document(DocumentProcessingRequest),
    /// Generate an assistant reply for a chat message.
    #[serde(rename = "process_chat_message")]
    Chat(ChatProcessingRequest),
}

/// Document conversion request.
///
/// Carries everything the processor needs to work without calling back for
/// context: where to fetch the original, where to post each artifact, and
/// the single-purpose token authorizing those callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentProcessingRequest {
    pub source: String,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub filename: String,
    pub content_type: String,
    /// Authenticated URL for fetching the original upload.
    pub download_url: String,
    /// Where the markdown artifact is posted back.
    pub markdown_callback_url: String,
    /// Where the vector batch is posted back.
    pub vectors_callback_url: String,
    /// Plaintext resource token presented on every callback.
    pub callback_token: String,
}

/// Chat reply request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatProcessingRequest {
    pub source: String,
    pub tenant_id: Uuid,
    pub exchange_id: Uuid,
    pub conversation_id: Uuid,
    pub message: String,
    /// Where the assistant reply is posted back.
    pub reply_callback_url: String,
    /// Plaintext resource token presented on the reply callback.
    pub callback_token: String,
}

impl ProcessingRequest {
    /// Owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> Uuid {
        match self {
            ProcessingRequest::Document(r) => r.tenant_id,
            ProcessingRequest::Chat(r) => r.tenant_id,
        }
    }

    /// Id of the resource the request was initiated for.
    #[must_use]
    pub fn resource_id(&self) -> Uuid {
        match self {
            ProcessingRequest::Document(r) => r.document_id,
            ProcessingRequest::Chat(r) => r.exchange_id,
        }
    }

    /// Delivery type tag stored on the retry record.
    #[must_use]
    pub fn delivery_type(&self) -> DeliveryType {
        match self {
            ProcessingRequest::Document(_) => DeliveryType::DocumentProcessing,
            ProcessingRequest::Chat(_) => DeliveryType::ChatMessage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document_request() -> ProcessingRequest {
        ProcessingRequest::Document(DocumentProcessingRequest {
            source: REQUEST_SOURCE.to_string(),
            tenant_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            filename: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            download_url: "https://api.example.com/api/ingest/documents/x/download".to_string(),
            markdown_callback_url: "https://api.example.com/api/ingest/documents/x/callback"
                .to_string(),
            vectors_callback_url: "https://api.example.com/api/ingest/vectors/callback/x"
                .to_string(),
            callback_token: "tok".to_string(),
        })
    }

    #[test]
    fn test_action_tag_on_wire() {
        let value = serde_json::to_value(sample_document_request()).unwrap();
        assert_eq!(value["action"], "process_document");
        assert_eq!(value["source"], REQUEST_SOURCE);
        assert!(value["download_url"].is_string());
    }

    #[test]
    fn test_roundtrip_preserves_resource_id() {
        let request = sample_document_request();
        let id = request.resource_id();
        let bytes = serde_json::to_vec(&request).unwrap();
        let parsed: ProcessingRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.resource_id(), id);
        assert_eq!(parsed.delivery_type(), DeliveryType::DocumentProcessing);
    }

    #[test]
    fn test_chat_delivery_type() {
        let request = ProcessingRequest::Chat(ChatProcessingRequest {
            source: REQUEST_SOURCE.to_string(),
            tenant_id: Uuid::new_v4(),
            exchange_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            message: "hello".to_string(),
            reply_callback_url: "https://api.example.com/api/ingest/chat/x/callback".to_string(),
            callback_token: "tok".to_string(),
        });
        assert_eq!(request.delivery_type(), DeliveryType::ChatMessage);
    }
}
