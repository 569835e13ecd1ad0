//! Tenant-scoped callback token storage.
//!
//! Exactly one active token per tenant; rotation upserts the hash and the
//! prior token becomes invalid in the same statement.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// The active tenant-wide token hash for one tenant.
#[derive(Debug, Clone, FromRow)]
pub struct TenantToken {
    pub tenant_id: Uuid,
    /// SHA-256 hex hash of the token value. Plaintext is never stored.
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    /// Last rotation time (equals `created_at` until the first rotation).
    pub rotated_at: DateTime<Utc>,
}

impl TenantToken {
    /// Upsert the tenant's single active token hash.
    pub async fn upsert<'e, E>(
        executor: E,
        tenant_id: Uuid,
        token_hash: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO tenant_tokens (tenant_id, token_hash)
            VALUES ($1, $2)
            ON CONFLICT (tenant_id)
            DO UPDATE SET token_hash = EXCLUDED.token_hash, rotated_at = NOW()
            RETURNING tenant_id, token_hash, created_at, rotated_at
            ",
        )
        .bind(tenant_id)
        .bind(token_hash)
        .fetch_one(executor)
        .await
    }

    /// Fetch the active token hash for a tenant.
    pub async fn find_by_tenant<'e, E>(
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT tenant_id, token_hash, created_at, rotated_at
            FROM tenant_tokens
            WHERE tenant_id = $1
            ",
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await
    }
}
