//! Vector search execution log.
//!
//! Every search writes one row, success or failure, so operability data is
//! never silently dropped. Failed searches record `result_count = -1`.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// Sentinel result count for failed searches.
pub const FAILED_SEARCH_SENTINEL: i32 = -1;

/// One logged search execution.
#[derive(Debug, Clone, FromRow)]
pub struct VectorSearchLog {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Correlation id when the search was authorized by a message token.
    pub correlation_id: Option<Uuid>,
    pub duration_ms: i32,
    /// Number of hits returned, or -1 when the search failed.
    pub result_count: i32,
    /// "ok" or "error".
    pub outcome: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for one log row.
#[derive(Debug, Clone)]
pub struct CreateVectorSearchLog {
    pub tenant_id: Uuid,
    pub correlation_id: Option<Uuid>,
    pub duration_ms: i32,
    pub result_count: i32,
    pub outcome: String,
    pub error: Option<String>,
}

impl VectorSearchLog {
    /// Append a search log row.
    pub async fn create<'e, E>(
        executor: E,
        input: CreateVectorSearchLog,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO vector_search_log
                (tenant_id, correlation_id, duration_ms, result_count, outcome, error)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, correlation_id, duration_ms, result_count,
                      outcome, error, created_at
            ",
        )
        .bind(input.tenant_id)
        .bind(input.correlation_id)
        .bind(input.duration_ms)
        .bind(input.result_count)
        .bind(input.outcome)
        .bind(input.error)
        .fetch_one(executor)
        .await
    }
}
