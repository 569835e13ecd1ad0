//! Concrete event types published by the ingestion pipeline.

mod processing;

pub use processing::{ChatMessageSubmitted, DocumentSubmitted};
