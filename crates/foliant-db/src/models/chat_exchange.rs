//! Chat exchange entity model.
//!
//! One exchange is a user message plus the assistant reply produced by the
//! external processing service. Exchanges reuse the document lifecycle
//! statuses; the only artifact they need for `ready` is the reply.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use super::document::ResourceStatus;
use foliant_core::{TenantId, TenantScoped};

/// A chat exchange record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct ChatExchange {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Conversation this exchange belongs to.
    pub conversation_id: Uuid,
    /// The user's message text.
    pub user_message: String,
    /// The assistant reply, once the callback lands.
    pub assistant_reply: Option<String>,
    /// Lifecycle status string (see [`ResourceStatus`]).
    pub status: String,
    /// SHA-256 hex hash of the resource-scoped callback token.
    pub callback_token_hash: String,
    /// Error message when processing failed.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a chat exchange row.
#[derive(Debug, Clone)]
pub struct CreateChatExchange {
    pub tenant_id: Uuid,
    pub conversation_id: Uuid,
    pub user_message: String,
    pub callback_token_hash: String,
}

impl TenantScoped for ChatExchange {
    fn tenant_id(&self) -> TenantId {
        TenantId::from_uuid(self.tenant_id)
    }
}

impl ChatExchange {
    /// Parsed lifecycle status.
    #[must_use]
    pub fn status_enum(&self) -> Option<ResourceStatus> {
        self.status.parse().ok()
    }

    /// Create a new exchange row in `uploading` state.
    pub async fn create<'e, E>(executor: E, input: CreateChatExchange) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO chat_exchanges
                (tenant_id, conversation_id, user_message, status, callback_token_hash)
            VALUES ($1, $2, $3, 'uploading', $4)
            RETURNING id, tenant_id, conversation_id, user_message, assistant_reply,
                      status, callback_token_hash, error_message, created_at, updated_at
            ",
        )
        .bind(input.tenant_id)
        .bind(input.conversation_id)
        .bind(input.user_message)
        .bind(input.callback_token_hash)
        .fetch_one(executor)
        .await
    }

    /// Find an exchange scoped to its tenant.
    pub async fn find_by_id<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, conversation_id, user_message, assistant_reply,
                   status, callback_token_hash, error_message, created_at, updated_at
            FROM chat_exchanges
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Callback-path lookup by id alone; the owning tenant is read from the
    /// row so a mismatch can surface as 403 instead of 404.
    pub async fn find_for_callback<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, conversation_id, user_message, assistant_reply,
                   status, callback_token_hash, error_message, created_at, updated_at
            FROM chat_exchanges
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Unconditional status update (submit path).
    pub async fn set_status<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: ResourceStatus,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE chat_exchanges
            SET status = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status.to_string())
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Persist the assistant reply and move straight to `ready`.
    ///
    /// Conditional on `processing` so a replayed callback is a no-op:
    /// `false` means the exchange was not in an accepting state.
    pub async fn apply_reply<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        reply: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE chat_exchanges
            SET assistant_reply = $3, status = 'ready', updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'processing'
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(reply)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a non-terminal exchange to `failed`, persisting the error.
    pub async fn mark_failed<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        error: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE chat_exchanges
            SET status = 'failed', error_message = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status NOT IN ('ready', 'failed')
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(error)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
