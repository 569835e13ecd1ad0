//! Database entity models for foliant-db.
//!
//! One module per table; each provides a `FromRow` struct and static query
//! methods generic over `PgExecutor`.

pub mod chat_exchange;
pub mod delivery_record;
pub mod document;
pub mod tenant_token;
pub mod vector_chunk;
pub mod vector_search_log;

pub use chat_exchange::{ChatExchange, CreateChatExchange};
pub use delivery_record::{CreateDeliveryRecord, DeliveryRecord, DeliveryStatus, DeliveryType};
pub use document::{CreateDocument, Document, ResourceStatus};
pub use tenant_token::TenantToken;
pub use vector_chunk::{CreateVectorChunk, VectorChunk, VectorSearchHit};
pub use vector_search_log::{CreateVectorSearchLog, VectorSearchLog};
