//! HTTP surface of the foliant ingestion pipeline.
//!
//! Tenant-scoped submission endpoints, processor-facing callback endpoints,
//! vector search, delivery inspection, and the SSE event stream. Handlers
//! are thin: authentication goes through the token authority, state
//! transitions through the conditional updates in `foliant-db`, and every
//! transition fans out to the owning tenant's stream clients.

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;

pub use error::ApiError;
pub use router::{ingest_router, IngestState};
