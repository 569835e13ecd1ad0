//! Delivery history inspection handlers.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use foliant_core::TenantId;
use foliant_db::models::DeliveryRecord;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{require_header, TENANT_ID_HEADER, TENANT_TOKEN_HEADER};
use crate::models::{DeliveryListResponse, DeliveryResponse, ListDeliveriesQuery};
use crate::router::IngestState;

async fn authorize_tenant(state: &IngestState, headers: &HeaderMap) -> ApiResult<Uuid> {
    let token = require_header(headers, TENANT_TOKEN_HEADER)?;
    let tenant_id: Uuid = require_header(headers, TENANT_ID_HEADER)?
        .parse()
        .map_err(|_| ApiError::Validation("x-tenant-id must be a UUID".into()))?;
    state
        .authority
        .verify_tenant_token(TenantId::from_uuid(tenant_id), token)
        .await?;
    Ok(tenant_id)
}

/// List the tenant's delivery records, newest first.
#[utoipa::path(
    get,
    path = "/api/ingest/deliveries",
    tag = "Deliveries",
    params(ListDeliveriesQuery),
    responses(
        (status = 200, description = "Delivery records", body = DeliveryListResponse),
        (status = 401, description = "Invalid tenant token"),
    )
)]
pub async fn list_deliveries_handler(
    State(state): State<IngestState>,
    headers: HeaderMap,
    Query(query): Query<ListDeliveriesQuery>,
) -> ApiResult<Json<DeliveryListResponse>> {
    let tenant_id = authorize_tenant(&state, &headers).await?;

    let limit = query.limit.clamp(1, 100);
    let offset = query.offset.max(0);

    let records = DeliveryRecord::list_by_tenant(
        state.pool(),
        tenant_id,
        limit,
        offset,
        query.status.as_deref(),
    )
    .await?;

    Ok(Json(DeliveryListResponse {
        items: records.into_iter().map(DeliveryResponse::from).collect(),
        limit,
        offset,
    }))
}

/// Fetch one delivery record.
#[utoipa::path(
    get,
    path = "/api/ingest/deliveries/{id}",
    tag = "Deliveries",
    params(("id" = Uuid, Path, description = "Delivery record ID")),
    responses(
        (status = 200, description = "Delivery record", body = DeliveryResponse),
        (status = 401, description = "Invalid tenant token"),
        (status = 404, description = "Unknown delivery record"),
    )
)]
pub async fn get_delivery_handler(
    State(state): State<IngestState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeliveryResponse>> {
    let tenant_id = authorize_tenant(&state, &headers).await?;

    let record = DeliveryRecord::find_by_id(state.pool(), tenant_id, id)
        .await?
        .ok_or(ApiError::NotFound("Delivery record"))?;

    Ok(Json(DeliveryResponse::from(record)))
}
