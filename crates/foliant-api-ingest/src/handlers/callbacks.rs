//! Processor callback handlers: markdown, vector batches, chat replies.
//!
//! Callbacks authenticate with resource-scoped tokens and are idempotent:
//! the state transitions are conditional updates in `foliant-db`, so a
//! replayed callback that finds the resource already settled acknowledges
//! without changing anything. The pipeline is at-least-once end to end and
//! the processor is free to retry.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use foliant_core::TenantId;
use foliant_db::models::{ChatExchange, CreateVectorChunk, Document, ResourceStatus, VectorChunk};
use foliant_stream::StreamEvent;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{require_header, CALLBACK_TOKEN_HEADER, VECTOR_CALLBACK_TOKEN_HEADER};
use crate::models::{
    CallbackResponse, MarkdownCallbackRequest, ReplyCallbackRequest, VectorCallbackRequest,
    VectorCallbackResponse,
};
use crate::router::IngestState;

/// Receive the markdown artifact (or a processing failure) for a document.
#[utoipa::path(
    post,
    path = "/api/ingest/documents/{id}/callback",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = MarkdownCallbackRequest,
    responses(
        (status = 200, description = "Artifact recorded", body = CallbackResponse),
        (status = 401, description = "Invalid resource token"),
        (status = 403, description = "Tenant mismatch"),
        (status = 404, description = "Unknown document"),
    )
)]
pub async fn markdown_callback_handler(
    State(state): State<IngestState>,
    Path(id): Path<Uuid>,
    headers: axum::http::HeaderMap,
    Json(body): Json<MarkdownCallbackRequest>,
) -> ApiResult<Json<CallbackResponse>> {
    let token = require_header(&headers, CALLBACK_TOKEN_HEADER)?;
    let tenant = TenantId::from_uuid(body.tenant_id);
    let doc = state
        .authority
        .verify_document_token(id, tenant, token)
        .await?;

    if let Some(error) = body.error {
        let failed = Document::mark_failed(state.pool(), doc.tenant_id, id, &error).await?;
        if failed {
            state
                .hub
                .broadcast(tenant, StreamEvent::status_changed("document", id, "failed"))
                .await;
            tracing::warn!(
                target: "ingest_api",
                tenant_id = %tenant,
                document_id = %id,
                error = %error,
                "Processor reported document failure"
            );
        }
        return Ok(Json(CallbackResponse {
            success: true,
            message: if failed {
                "Processing failure recorded".into()
            } else {
                "Document already settled; failure ignored".into()
            },
        }));
    }

    let Some(markdown) = body.markdown else {
        return Err(ApiError::Validation(
            "either markdown or error is required".into(),
        ));
    };

    match Document::apply_markdown(state.pool(), doc.tenant_id, id, &markdown).await? {
        Some(status) => {
            state
                .hub
                .broadcast(
                    tenant,
                    StreamEvent::status_changed("document", id, &status.to_string()),
                )
                .await;
            tracing::info!(
                target: "ingest_api",
                tenant_id = %tenant,
                document_id = %id,
                status = %status,
                "Markdown artifact stored"
            );
            Ok(Json(CallbackResponse {
                success: true,
                message: "Markdown stored".into(),
            }))
        }
        // Conditional update matched nothing: the artifact already landed
        // or the document is terminal. Acknowledge the replay.
        None => Ok(Json(CallbackResponse {
            success: true,
            message: "Callback already applied".into(),
        })),
    }
}

/// Receive a batch of vector chunks for a document.
///
/// Entries with a wrong embedding dimension or empty chunk text are skipped
/// individually; one malformed entry never discards the rest of the batch.
#[utoipa::path(
    post,
    path = "/api/ingest/vectors/callback/{callback_id}",
    tag = "Callbacks",
    params(("callback_id" = Uuid, Path, description = "Vector callback ID (document ID)")),
    request_body = VectorCallbackRequest,
    responses(
        (status = 200, description = "Batch processed", body = VectorCallbackResponse),
        (status = 401, description = "Invalid resource token"),
        (status = 403, description = "Tenant mismatch"),
        (status = 404, description = "Unknown callback id"),
    )
)]
pub async fn vector_callback_handler(
    State(state): State<IngestState>,
    Path(callback_id): Path<Uuid>,
    headers: axum::http::HeaderMap,
    Json(body): Json<VectorCallbackRequest>,
) -> ApiResult<Json<VectorCallbackResponse>> {
    let token = require_header(&headers, VECTOR_CALLBACK_TOKEN_HEADER)?;
    let tenant = TenantId::from_uuid(body.tenant_id);
    let doc = state
        .authority
        .verify_document_token(callback_id, tenant, token)
        .await?;

    if body.vectors.is_empty() {
        return Err(ApiError::Validation("vectors must not be empty".into()));
    }

    // Chunks are only accepted while the document is still waiting on this
    // artifact. A replayed batch on a settled document must not duplicate
    // chunks, so gate the inserts the same way the markdown path does.
    let accepting = matches!(
        doc.status_enum(),
        Some(ResourceStatus::Processing | ResourceStatus::MarkdownReceived)
    );
    if !accepting {
        tracing::info!(
            target: "ingest_api",
            tenant_id = %tenant,
            document_id = %callback_id,
            status = %doc.status,
            "Vector callback replay ignored"
        );
        return Ok(Json(VectorCallbackResponse {
            success: true,
            stored: 0,
            skipped: 0,
            message: "Callback already applied".into(),
        }));
    }

    let mut stored = 0usize;
    let mut skipped = 0usize;
    for entry in body.vectors {
        if entry.embedding.len() != state.embedding_dimension || entry.chunk_text.is_empty() {
            tracing::warn!(
                target: "ingest_api",
                document_id = %callback_id,
                chunk_index = entry.chunk_index,
                dimension = entry.embedding.len(),
                expected = state.embedding_dimension,
                "Skipping malformed vector entry"
            );
            skipped += 1;
            continue;
        }
        VectorChunk::insert(
            state.pool(),
            CreateVectorChunk {
                tenant_id: doc.tenant_id,
                document_id: callback_id,
                chunk_text: entry.chunk_text,
                embedding: entry.embedding,
                chunk_index: entry.chunk_index,
                metadata: entry.metadata,
            },
        )
        .await
        .map_err(foliant_db::DbError::from)?;
        stored += 1;
    }

    if stored > 0 {
        if let Some(status) =
            Document::apply_vectors_received(state.pool(), doc.tenant_id, callback_id).await?
        {
            state
                .hub
                .broadcast(
                    tenant,
                    StreamEvent::status_changed("document", callback_id, &status.to_string()),
                )
                .await;
        }
    }

    tracing::info!(
        target: "ingest_api",
        tenant_id = %tenant,
        document_id = %callback_id,
        stored,
        skipped,
        "Vector batch processed"
    );

    Ok(Json(VectorCallbackResponse {
        success: stored > 0,
        stored,
        skipped,
        message: if skipped == 0 {
            "Vectors stored".into()
        } else {
            format!("Stored {stored} vectors, skipped {skipped} malformed entries")
        },
    }))
}

/// Receive the assistant reply (or a processing failure) for an exchange.
#[utoipa::path(
    post,
    path = "/api/ingest/chat/{id}/callback",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "Chat exchange ID")),
    request_body = ReplyCallbackRequest,
    responses(
        (status = 200, description = "Reply recorded", body = CallbackResponse),
        (status = 401, description = "Invalid resource token"),
        (status = 403, description = "Tenant mismatch"),
        (status = 404, description = "Unknown exchange"),
    )
)]
pub async fn reply_callback_handler(
    State(state): State<IngestState>,
    Path(id): Path<Uuid>,
    headers: axum::http::HeaderMap,
    Json(body): Json<ReplyCallbackRequest>,
) -> ApiResult<Json<CallbackResponse>> {
    let token = require_header(&headers, CALLBACK_TOKEN_HEADER)?;
    let tenant = TenantId::from_uuid(body.tenant_id);
    let exchange = state
        .authority
        .verify_exchange_token(id, tenant, token)
        .await?;

    if let Some(error) = body.error {
        let failed = ChatExchange::mark_failed(state.pool(), exchange.tenant_id, id, &error).await?;
        if failed {
            state
                .hub
                .broadcast(
                    tenant,
                    StreamEvent::status_changed("chat_exchange", id, "failed"),
                )
                .await;
        }
        return Ok(Json(CallbackResponse {
            success: true,
            message: if failed {
                "Processing failure recorded".into()
            } else {
                "Exchange already settled; failure ignored".into()
            },
        }));
    }

    let Some(reply) = body.reply else {
        return Err(ApiError::Validation(
            "either reply or error is required".into(),
        ));
    };

    let applied = ChatExchange::apply_reply(state.pool(), exchange.tenant_id, id, &reply).await?;
    if applied {
        state
            .hub
            .broadcast(
                tenant,
                StreamEvent::chat_reply(id, exchange.conversation_id, &reply),
            )
            .await;
        state
            .hub
            .broadcast(
                tenant,
                StreamEvent::status_changed("chat_exchange", id, "ready"),
            )
            .await;
        tracing::info!(
            target: "ingest_api",
            tenant_id = %tenant,
            exchange_id = %id,
            "Assistant reply stored"
        );
        Ok(Json(CallbackResponse {
            success: true,
            message: "Reply stored".into(),
        }))
    } else {
        Ok(Json(CallbackResponse {
            success: true,
            message: "Callback already applied".into(),
        }))
    }
}
