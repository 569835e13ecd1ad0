//! Request/response DTOs for the ingest API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Document submission
// ---------------------------------------------------------------------------

/// Body of `POST /api/ingest/documents`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitDocumentRequest {
    pub tenant_id: Uuid,
    pub filename: String,
    pub content_type: String,
    /// Base64-encoded original file bytes.
    pub content_base64: String,
}

/// 202 body for both submission endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Chat submission
// ---------------------------------------------------------------------------

/// Body of `POST /api/ingest/chat/messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitChatRequest {
    pub tenant_id: Uuid,
    /// Omitted on the first message of a conversation; the server assigns.
    pub conversation_id: Option<Uuid>,
    pub message: String,
}

/// 202 body for chat submissions; includes the conversation id so the
/// client can thread follow-ups.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitChatResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Processor callbacks
// ---------------------------------------------------------------------------

/// Body of the markdown callback. Exactly one of `markdown` and `error`
/// is expected; `error` wins when both are present.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkdownCallbackRequest {
    pub tenant_id: Uuid,
    pub markdown: Option<String>,
    pub error: Option<String>,
}

/// Body of the chat reply callback.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyCallbackRequest {
    pub tenant_id: Uuid,
    pub reply: Option<String>,
    pub error: Option<String>,
}

/// Generic callback acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackResponse {
    pub success: bool,
    pub message: String,
}

/// One vector entry in a vector callback batch.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VectorPayload {
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub chunk_index: i32,
    #[serde(default)]
    pub metadata: JsonValue,
}

/// Body of `POST /api/ingest/vectors/callback/:callback_id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VectorCallbackRequest {
    pub tenant_id: Uuid,
    pub vectors: Vec<VectorPayload>,
}

/// Acknowledgement of a vector batch; malformed entries are skipped, not
/// fatal.
#[derive(Debug, Serialize, ToSchema)]
pub struct VectorCallbackResponse {
    pub success: bool,
    pub stored: usize,
    pub skipped: usize,
    pub message: String,
}

/// Acknowledgement of a vector purge.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurgeVectorsResponse {
    pub success: bool,
    /// Chunks removed by the purge.
    pub removed: u64,
}

// ---------------------------------------------------------------------------
// Vector search
// ---------------------------------------------------------------------------

/// Body of `POST /api/ingest/search`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub tenant_id: Uuid,
    pub embedding: Vec<f32>,
    /// Exchange id when the search is authorized by a message-scoped token.
    pub correlation_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// One similarity hit.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchHit {
    pub document_id: Uuid,
    pub chunk_text: String,
    pub chunk_index: i32,
    pub metadata: JsonValue,
    /// Cosine distance; smaller is closer.
    pub distance: f64,
}

/// Body of the search response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub duration_ms: i32,
}

// ---------------------------------------------------------------------------
// Tenant token rotation
// ---------------------------------------------------------------------------

/// The plaintext token, returned exactly once at rotation.
#[derive(Debug, Serialize, ToSchema)]
pub struct RotateTokenResponse {
    pub tenant_id: Uuid,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Delivery inspection
// ---------------------------------------------------------------------------

/// Query parameters for the delivery list endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListDeliveriesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Optional status filter: pending, retrying, succeeded, failed.
    pub status: Option<String>,
}

fn default_limit() -> i64 {
    50
}

/// One delivery record in inspection responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub delivery_type: String,
    pub status: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of the delivery list endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryListResponse {
    pub items: Vec<DeliveryResponse>,
    pub limit: i64,
    pub offset: i64,
}

impl From<foliant_db::models::DeliveryRecord> for DeliveryResponse {
    fn from(record: foliant_db::models::DeliveryRecord) -> Self {
        Self {
            id: record.id,
            delivery_type: record.delivery_type,
            status: record.status,
            retry_count: record.retry_count,
            max_retries: record.max_retries,
            next_retry_at: record.next_retry_at,
            last_error: record.last_error,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
