//! Chat message submission handler.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use foliant_core::TenantId;
use foliant_db::models::{ChatExchange, CreateChatExchange, ResourceStatus};
use foliant_delivery::payload::{ChatProcessingRequest, ProcessingRequest, REQUEST_SOURCE};
use foliant_stream::StreamEvent;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{require_header, TENANT_TOKEN_HEADER};
use crate::models::{SubmitChatRequest, SubmitChatResponse};
use crate::router::IngestState;

/// Submit a chat message for an assistant reply.
///
/// Same acceptance contract as document submission: the exchange row is
/// durable and the request dispatched before the 202 goes out.
#[utoipa::path(
    post,
    path = "/api/ingest/chat/messages",
    tag = "Chat",
    request_body = SubmitChatRequest,
    responses(
        (status = 202, description = "Accepted for processing", body = SubmitChatResponse),
        (status = 400, description = "Invalid submission"),
        (status = 401, description = "Invalid tenant token"),
    )
)]
pub async fn submit_chat_handler(
    State(state): State<IngestState>,
    headers: HeaderMap,
    Json(body): Json<SubmitChatRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = require_header(&headers, TENANT_TOKEN_HEADER)?;
    let tenant = TenantId::from_uuid(body.tenant_id);
    state.authority.verify_tenant_token(tenant, token).await?;

    if body.message.trim().is_empty() {
        return Err(ApiError::Validation("message must not be empty".into()));
    }

    let conversation_id = body.conversation_id.unwrap_or_else(Uuid::new_v4);
    let minted = state.authority.mint_resource_token();
    let exchange = ChatExchange::create(
        state.pool(),
        CreateChatExchange {
            tenant_id: body.tenant_id,
            conversation_id,
            user_message: body.message,
            callback_token_hash: minted.token_hash,
        },
    )
    .await?;

    ChatExchange::set_status(
        state.pool(),
        exchange.tenant_id,
        exchange.id,
        ResourceStatus::Processing,
    )
    .await?;

    let base = &state.public_base_url;
    state
        .publisher
        .dispatch(ProcessingRequest::Chat(ChatProcessingRequest {
            source: REQUEST_SOURCE.to_string(),
            tenant_id: exchange.tenant_id,
            exchange_id: exchange.id,
            conversation_id,
            message: exchange.user_message.clone(),
            reply_callback_url: format!("{base}/api/ingest/chat/{}/callback", exchange.id),
            callback_token: minted.token,
        }));

    state
        .hub
        .broadcast(
            tenant,
            StreamEvent::status_changed("chat_exchange", exchange.id, "processing"),
        )
        .await;

    tracing::info!(
        target: "ingest_api",
        tenant_id = %tenant,
        exchange_id = %exchange.id,
        conversation_id = %conversation_id,
        "Chat message accepted for processing"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitChatResponse {
            id: exchange.id,
            conversation_id,
            status: ResourceStatus::Processing.to_string(),
        }),
    ))
}
