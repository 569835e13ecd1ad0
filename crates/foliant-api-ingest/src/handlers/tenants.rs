//! Tenant token rotation handler.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use foliant_core::TenantId;
use foliant_db::models::TenantToken;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{require_header, TENANT_TOKEN_HEADER};
use crate::models::RotateTokenResponse;
use crate::router::IngestState;

/// Rotate a tenant's token, returning the new plaintext exactly once.
///
/// An existing token must be presented to rotate it; a tenant with no
/// token yet gets its first one without a credential (bootstrap). The
/// prior token stops working in the same statement.
#[utoipa::path(
    post,
    path = "/api/ingest/tenants/{id}/token/rotate",
    tag = "Tenants",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "New token minted", body = RotateTokenResponse),
        (status = 401, description = "Current tenant token required"),
    )
)]
pub async fn rotate_token_handler(
    State(state): State<IngestState>,
    Path(tenant_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<RotateTokenResponse>> {
    let tenant = TenantId::from_uuid(tenant_id);

    let existing = TenantToken::find_by_tenant(state.pool(), tenant_id).await?;
    if existing.is_some() {
        let presented = require_header(&headers, TENANT_TOKEN_HEADER)?;
        state
            .authority
            .verify_tenant_token(tenant, presented)
            .await?;
    }

    let token = state
        .authority
        .rotate_tenant_token(tenant)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(RotateTokenResponse { tenant_id, token }))
}
