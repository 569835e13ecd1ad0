//! Health and readiness probe handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use sqlx::PgPool;

/// State shared by the probe handlers.
#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    /// Flipped by the shutdown handler so readiness fails while draining.
    pub shutting_down: Arc<AtomicBool>,
}

/// Basic liveness-style health report.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe: the process is up.
pub async fn livez_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: accepts traffic only with a reachable database and no
/// shutdown in progress.
pub async fn readyz_handler(State(state): State<HealthState>) -> (StatusCode, Json<serde_json::Value>) {
    if state.shutting_down.load(Ordering::Acquire) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "shutting_down" })),
        );
    }

    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "database_unavailable" })),
            )
        }
    }
}
