//! Vector similarity search handler.

use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use foliant_core::TenantId;
use foliant_db::models::{CreateVectorSearchLog, VectorChunk, VectorSearchLog};
use foliant_db::models::vector_search_log::FAILED_SEARCH_SENTINEL;
use foliant_db::DbError;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{require_header, SEARCH_TOKEN_HEADER};
use crate::models::{SearchHit, SearchRequest, SearchResponse};
use crate::router::IngestState;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Execute a tenant-scoped similarity search.
///
/// Two credentials open this door: the tenant token, or an exchange-scoped
/// token presented together with its `correlation_id`. Every search is
/// logged, including rejected and failed ones; anything that produced no
/// results logs a result count of -1 so the log never has silent gaps.
#[utoipa::path(
    post,
    path = "/api/ingest/search",
    tag = "Search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Dimension mismatch"),
        (status = 401, description = "Invalid search token"),
        (status = 503, description = "Vector index unavailable"),
    )
)]
pub async fn search_handler(
    State(state): State<IngestState>,
    headers: HeaderMap,
    Json(body): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let started = Instant::now();
    let tenant = TenantId::from_uuid(body.tenant_id);

    let token = match require_header(&headers, SEARCH_TOKEN_HEADER) {
        Ok(token) => token,
        Err(denied) => return Err(reject(&state, &body, started, denied).await),
    };
    if let Err(denied) = authorize(&state, tenant, &body, token).await {
        return Err(reject(&state, &body, started, denied).await);
    }

    if body.embedding.len() != state.embedding_dimension {
        let denied = ApiError::Validation(format!(
            "embedding dimension {} does not match expected {}",
            body.embedding.len(),
            state.embedding_dimension
        ));
        return Err(reject(&state, &body, started, denied).await);
    }

    let limit = body.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let outcome = VectorChunk::search(state.pool(), body.tenant_id, &body.embedding, limit)
        .await
        .map_err(DbError::from);
    let duration_ms = started.elapsed().as_millis().min(i32::MAX as u128) as i32;

    match outcome {
        Ok(hits) => {
            log_search(
                &state,
                &body,
                duration_ms,
                hits.len() as i32,
                "ok",
                None,
            )
            .await;

            let results = hits
                .into_iter()
                .map(|hit| SearchHit {
                    document_id: hit.document_id,
                    chunk_text: hit.chunk_text,
                    chunk_index: hit.chunk_index,
                    metadata: hit.metadata,
                    distance: hit.distance,
                })
                .collect();
            Ok(Json(SearchResponse {
                results,
                duration_ms,
            }))
        }
        Err(error) => {
            log_search(
                &state,
                &body,
                duration_ms,
                FAILED_SEARCH_SENTINEL,
                "error",
                Some(error.to_string()),
            )
            .await;
            Err(ApiError::from(error))
        }
    }
}

/// Log a search that never reached the index, then hand the error back.
async fn reject(
    state: &IngestState,
    body: &SearchRequest,
    started: Instant,
    denied: ApiError,
) -> ApiError {
    let duration_ms = started.elapsed().as_millis().min(i32::MAX as u128) as i32;
    log_search(
        state,
        body,
        duration_ms,
        FAILED_SEARCH_SENTINEL,
        "rejected",
        Some(denied.to_string()),
    )
    .await;
    denied
}

/// Tenant token first; fall back to an exchange token when the request is
/// correlated to a specific exchange.
async fn authorize(
    state: &IngestState,
    tenant: TenantId,
    body: &SearchRequest,
    token: &str,
) -> ApiResult<()> {
    match state.authority.verify_tenant_token(tenant, token).await {
        Ok(()) => Ok(()),
        Err(tenant_failure) => match body.correlation_id {
            Some(exchange_id) => {
                state
                    .authority
                    .verify_exchange_token(exchange_id, tenant, token)
                    .await?;
                Ok(())
            }
            None => Err(ApiError::from(tenant_failure)),
        },
    }
}

/// Append the search log row; a logging failure must not fail the search.
async fn log_search(
    state: &IngestState,
    body: &SearchRequest,
    duration_ms: i32,
    result_count: i32,
    outcome: &str,
    error: Option<String>,
) {
    let row = CreateVectorSearchLog {
        tenant_id: body.tenant_id,
        correlation_id: body.correlation_id,
        duration_ms,
        result_count,
        outcome: outcome.to_string(),
        error,
    };
    if let Err(log_error) = VectorSearchLog::create(state.pool(), row).await {
        tracing::error!(
            target: "ingest_api",
            tenant_id = %body.tenant_id,
            error = %log_error,
            "Failed to write vector search log"
        );
    }
}
