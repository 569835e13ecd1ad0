//! Server-sent events stream handler.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use futures::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use foliant_core::{ClientId, TenantId};
use foliant_stream::{BroadcastHub, StreamEvent};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{require_header, TENANT_ID_HEADER, TENANT_TOKEN_HEADER};
use crate::router::IngestState;

/// Unregisters the connection when the response stream is dropped.
struct StreamGuard {
    hub: BroadcastHub,
    tenant: TenantId,
    client_id: ClientId,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let hub = self.hub.clone();
        let tenant = self.tenant;
        let client_id = self.client_id;
        tokio::spawn(async move {
            hub.unregister(tenant, client_id).await;
        });
    }
}

/// Open a long-lived SSE connection scoped to one tenant.
///
/// The first event is `connected` with the assigned client id; heartbeats
/// arrive every 15 seconds from the hub, so no extra keep-alive layer is
/// needed here.
#[utoipa::path(
    get,
    path = "/api/ingest/events/stream",
    tag = "Events",
    responses(
        (status = 200, description = "SSE stream of tenant events"),
        (status = 401, description = "Invalid tenant token"),
    )
)]
pub async fn events_stream_handler(
    State(state): State<IngestState>,
    headers: HeaderMap,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let token = require_header(&headers, TENANT_TOKEN_HEADER)?;
    let tenant_id: Uuid = require_header(&headers, TENANT_ID_HEADER)?
        .parse()
        .map_err(|_| ApiError::Validation("x-tenant-id must be a UUID".into()))?;
    let tenant = TenantId::from_uuid(tenant_id);
    state.authority.verify_tenant_token(tenant, token).await?;

    let client_id = ClientId::new();
    let rx = state.hub.register(tenant, client_id).await;
    let guard = StreamGuard {
        hub: state.hub.clone(),
        tenant,
        client_id,
    };

    let events = tokio_stream::once(StreamEvent::connected(client_id))
        .chain(ReceiverStream::new(rx))
        .map(move |event| {
            // The guard lives as long as the stream does.
            let _keep = &guard;
            let data = serde_json::to_string(&event.data).unwrap_or_else(|_| "{}".to_string());
            Ok(Event::default().event(event.event).data(data))
        });

    Ok(Sse::new(events))
}
