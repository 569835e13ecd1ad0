//! Axum router setup for the ingest API.

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;

use foliant_auth::TokenAuthority;
use foliant_delivery::OutboundPublisher;
use foliant_stream::BroadcastHub;

use crate::handlers::{callbacks, chat, deliveries, documents, search, stream, tenants};

/// Shared state for ingest handlers.
#[derive(Clone)]
pub struct IngestState {
    pool: PgPool,
    pub authority: TokenAuthority,
    pub publisher: OutboundPublisher,
    pub hub: BroadcastHub,
    /// Base URL clients and the processor reach this service under; used
    /// to build download and callback URLs in outbound payloads.
    pub public_base_url: String,
    /// Expected embedding dimension for vector writes and searches.
    pub embedding_dimension: usize,
}

impl IngestState {
    pub fn new(
        pool: PgPool,
        publisher: OutboundPublisher,
        hub: BroadcastHub,
        public_base_url: impl Into<String>,
        embedding_dimension: usize,
    ) -> Self {
        let authority = TokenAuthority::new(pool.clone());
        Self {
            pool,
            authority,
            publisher,
            hub,
            public_base_url: public_base_url.into(),
            embedding_dimension,
        }
    }

    /// Get a reference to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Creates the ingest router with all routes.
pub fn ingest_router(state: IngestState) -> Router {
    Router::new()
        // Document lifecycle
        .route(
            "/api/ingest/documents",
            post(documents::submit_document_handler),
        )
        .route(
            "/api/ingest/documents/:id/download",
            get(documents::download_document_handler),
        )
        .route(
            "/api/ingest/documents/:id/callback",
            post(callbacks::markdown_callback_handler),
        )
        .route(
            "/api/ingest/documents/:id/vectors",
            delete(documents::delete_vectors_handler),
        )
        // Vector artifacts arrive under their own callback namespace with
        // a separately named token header.
        .route(
            "/api/ingest/vectors/callback/:callback_id",
            post(callbacks::vector_callback_handler),
        )
        // Chat lifecycle
        .route("/api/ingest/chat/messages", post(chat::submit_chat_handler))
        .route(
            "/api/ingest/chat/:id/callback",
            post(callbacks::reply_callback_handler),
        )
        // Vector search
        .route("/api/ingest/search", post(search::search_handler))
        // Tenant token rotation
        .route(
            "/api/ingest/tenants/:id/token/rotate",
            post(tenants::rotate_token_handler),
        )
        // Delivery inspection
        .route(
            "/api/ingest/deliveries",
            get(deliveries::list_deliveries_handler),
        )
        .route(
            "/api/ingest/deliveries/:id",
            get(deliveries::get_delivery_handler),
        )
        // Server-sent events
        .route(
            "/api/ingest/events/stream",
            get(stream::events_stream_handler),
        )
        .with_state(state)
}
