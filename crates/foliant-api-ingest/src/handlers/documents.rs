//! Document submission, download, and vector purge handlers.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use uuid::Uuid;

use foliant_auth::verify_token_hash;
use foliant_core::TenantId;
use foliant_db::models::{CreateDocument, Document, ResourceStatus, VectorChunk};
use foliant_delivery::payload::{DocumentProcessingRequest, ProcessingRequest, REQUEST_SOURCE};
use foliant_stream::StreamEvent;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{require_header, CALLBACK_TOKEN_HEADER, TENANT_ID_HEADER, TENANT_TOKEN_HEADER};
use crate::models::{PurgeVectorsResponse, SubmitDocumentRequest, SubmitResponse};
use crate::router::IngestState;

/// Submit a document for processing.
///
/// Accepts the upload, mints the resource-scoped callback token, dispatches
/// the processing request fire-and-forget, and answers 202 immediately; the
/// processor's availability never shows up in submission latency.
#[utoipa::path(
    post,
    path = "/api/ingest/documents",
    tag = "Documents",
    request_body = SubmitDocumentRequest,
    responses(
        (status = 202, description = "Accepted for processing", body = SubmitResponse),
        (status = 400, description = "Invalid submission"),
        (status = 401, description = "Invalid tenant token"),
    )
)]
pub async fn submit_document_handler(
    State(state): State<IngestState>,
    headers: HeaderMap,
    Json(body): Json<SubmitDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = require_header(&headers, TENANT_TOKEN_HEADER)?;
    let tenant = TenantId::from_uuid(body.tenant_id);
    state.authority.verify_tenant_token(tenant, token).await?;

    if body.filename.trim().is_empty() {
        return Err(ApiError::Validation("filename must not be empty".into()));
    }
    let content = BASE64
        .decode(&body.content_base64)
        .map_err(|_| ApiError::Validation("content_base64 is not valid base64".into()))?;
    if content.is_empty() {
        return Err(ApiError::Validation("document content must not be empty".into()));
    }

    let minted = state.authority.mint_resource_token();
    let doc = Document::create(
        state.pool(),
        CreateDocument {
            tenant_id: body.tenant_id,
            filename: body.filename,
            content_type: body.content_type,
            content,
            callback_token_hash: minted.token_hash,
        },
    )
    .await?;

    Document::set_status(state.pool(), doc.tenant_id, doc.id, ResourceStatus::Processing).await?;

    let base = &state.public_base_url;
    state
        .publisher
        .dispatch(ProcessingRequest::Document(DocumentProcessingRequest {
            source: REQUEST_SOURCE.to_string(),
            tenant_id: doc.tenant_id,
            document_id: doc.id,
            filename: doc.filename.clone(),
            content_type: doc.content_type.clone(),
            download_url: format!("{base}/api/ingest/documents/{}/download", doc.id),
            markdown_callback_url: format!("{base}/api/ingest/documents/{}/callback", doc.id),
            vectors_callback_url: format!("{base}/api/ingest/vectors/callback/{}", doc.id),
            callback_token: minted.token,
        }));

    state
        .hub
        .broadcast(tenant, StreamEvent::status_changed("document", doc.id, "processing"))
        .await;

    tracing::info!(
        target: "ingest_api",
        tenant_id = %tenant,
        document_id = %doc.id,
        filename = %doc.filename,
        "Document accepted for processing"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            id: doc.id,
            status: ResourceStatus::Processing.to_string(),
        }),
    ))
}

/// Serve the original bytes back to the processor.
///
/// Authorized by the resource-scoped callback token alone; the token was
/// minted for exactly this document, so there is no tenant claim to check.
#[utoipa::path(
    get,
    path = "/api/ingest/documents/{id}/download",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Original document bytes"),
        (status = 401, description = "Invalid resource token"),
        (status = 404, description = "Unknown document"),
    )
)]
pub async fn download_document_handler(
    State(state): State<IngestState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = require_header(&headers, CALLBACK_TOKEN_HEADER)?;

    let doc = Document::find_for_callback(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Document"))?;

    if !verify_token_hash(token, &doc.callback_token_hash) {
        tracing::warn!(
            target: "token_authority",
            document_id = %id,
            "Resource token verification failed on download"
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(([(header::CONTENT_TYPE, doc.content_type)], doc.content))
}

/// Purge a ready document's vector chunks.
///
/// The document row and markdown survive; only the searchable chunks go.
#[utoipa::path(
    delete,
    path = "/api/ingest/documents/{id}/vectors",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Vectors purged", body = PurgeVectorsResponse),
        (status = 400, description = "Document is not ready"),
        (status = 401, description = "Invalid tenant token"),
        (status = 404, description = "Unknown document"),
    )
)]
pub async fn delete_vectors_handler(
    State(state): State<IngestState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<PurgeVectorsResponse>> {
    let token = require_header(&headers, TENANT_TOKEN_HEADER)?;
    let tenant_id: Uuid = require_header(&headers, TENANT_ID_HEADER)?
        .parse()
        .map_err(|_| ApiError::Validation("x-tenant-id must be a UUID".into()))?;
    let tenant = TenantId::from_uuid(tenant_id);
    state.authority.verify_tenant_token(tenant, token).await?;

    Document::find_by_id(state.pool(), tenant_id, id)
        .await?
        .ok_or(ApiError::NotFound("Document"))?;

    // Guard the transition first so a non-ready document never loses chunks.
    let transitioned = Document::mark_vectors_deleted(state.pool(), tenant_id, id).await?;
    if !transitioned {
        return Err(ApiError::Validation(
            "vectors can only be purged from a ready document".into(),
        ));
    }

    let removed = VectorChunk::delete_by_document(state.pool(), tenant_id, id).await?;

    state
        .hub
        .broadcast(
            tenant,
            StreamEvent::status_changed("document", id, "vectors_deleted"),
        )
        .await;

    tracing::info!(
        target: "ingest_api",
        tenant_id = %tenant,
        document_id = %id,
        removed,
        "Vector chunks purged"
    );

    Ok(Json(PurgeVectorsResponse {
        success: true,
        removed,
    }))
}
