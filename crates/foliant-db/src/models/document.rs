//! Document entity model and the ingestion lifecycle status enum.
//!
//! A document is owned by exactly one tenant, carries its original bytes,
//! and accumulates derived artifacts (processed markdown, vector chunks) as
//! callbacks arrive. The pipeline never deletes documents; deletion is an
//! external CRUD concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use foliant_core::{TenantId, TenantScoped};

/// Lifecycle status of an ingested resource (document or chat exchange).
///
/// Stored as short strings (all ≤ 20 characters) in a text column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Row created, outbound publish not yet dispatched.
    Uploading,
    /// Handed to the external processing service.
    Processing,
    /// Markdown artifact persisted; vectors still outstanding.
    MarkdownReceived,
    /// Vector artifact persisted; markdown still outstanding.
    VectorsReceived,
    /// All required artifacts present; resource is queryable.
    Ready,
    /// Processing reported an explicit error, or retries were exhausted.
    Failed,
    /// Vectors purged after `Ready`; document metadata retained.
    VectorsDeleted,
}

impl ResourceStatus {
    /// True for states that accept no further callback-driven transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResourceStatus::Ready | ResourceStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// `Failed` is reachable from any non-terminal state; `VectorsDeleted`
    /// only from `Ready`; re-entering the current state is allowed so that
    /// replayed callbacks stay idempotent no-ops.
    #[must_use]
    pub fn can_transition_to(&self, next: ResourceStatus) -> bool {
        use ResourceStatus::*;
        if *self == next {
            return true;
        }
        match (*self, next) {
            (Uploading, Processing) => true,
            (Processing, MarkdownReceived | VectorsReceived | Ready) => true,
            (MarkdownReceived, Ready) => true,
            (VectorsReceived, Ready) => true,
            (Ready, VectorsDeleted) => true,
            (Uploading | Processing | MarkdownReceived | VectorsReceived, Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceStatus::Uploading => "uploading",
            ResourceStatus::Processing => "processing",
            ResourceStatus::MarkdownReceived => "markdown_received",
            ResourceStatus::VectorsReceived => "vectors_received",
            ResourceStatus::Ready => "ready",
            ResourceStatus::Failed => "failed",
            ResourceStatus::VectorsDeleted => "vectors_deleted",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(ResourceStatus::Uploading),
            "processing" => Ok(ResourceStatus::Processing),
            "markdown_received" => Ok(ResourceStatus::MarkdownReceived),
            "vectors_received" => Ok(ResourceStatus::VectorsReceived),
            "ready" => Ok(ResourceStatus::Ready),
            "failed" => Ok(ResourceStatus::Failed),
            "vectors_deleted" => Ok(ResourceStatus::VectorsDeleted),
            other => Err(format!("Invalid resource status: {other}")),
        }
    }
}

/// A document record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Original filename as submitted.
    pub filename: String,
    /// MIME type of the original content.
    pub content_type: String,
    /// Original file bytes, served back to the processor on download.
    pub content: Vec<u8>,
    /// Lifecycle status string (see [`ResourceStatus`]).
    pub status: String,
    /// SHA-256 hex hash of the resource-scoped callback token.
    pub callback_token_hash: String,
    /// Processed markdown artifact, once the callback lands.
    pub processed_markdown: Option<String>,
    /// Error message when processing failed.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a document row.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub tenant_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub callback_token_hash: String,
}

impl TenantScoped for Document {
    fn tenant_id(&self) -> TenantId {
        TenantId::from_uuid(self.tenant_id)
    }
}

impl Document {
    /// Parsed lifecycle status.
    #[must_use]
    pub fn status_enum(&self) -> Option<ResourceStatus> {
        self.status.parse().ok()
    }

    /// Create a new document row in `uploading` state.
    pub async fn create<'e, E>(executor: E, input: CreateDocument) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO documents
                (tenant_id, filename, content_type, content, status, callback_token_hash)
            VALUES ($1, $2, $3, $4, 'uploading', $5)
            RETURNING id, tenant_id, filename, content_type, content, status,
                      callback_token_hash, processed_markdown, error_message,
                      created_at, updated_at
            ",
        )
        .bind(input.tenant_id)
        .bind(input.filename)
        .bind(input.content_type)
        .bind(input.content)
        .bind(input.callback_token_hash)
        .fetch_one(executor)
        .await
    }

    /// Find a document scoped to its tenant.
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
            SELECT id, tenant_id, filename, content_type, content, status,
                   callback_token_hash, processed_markdown, error_message,
                   created_at, updated_at
            FROM documents
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Find a document by id alone.
    ///
    /// Used only on the callback path, where the owning tenant must be read
    /// from the row so a payload tenant mismatch can be reported as a 403
    /// rather than a 404.
    pub async fn find_for_callback<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, filename, content_type, content, status,
                   callback_token_hash, processed_markdown, error_message,
                   created_at, updated_at
            FROM documents
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Unconditional status update (submit path, `uploading` → `processing`).
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
            UPDATE documents
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

    /// Persist the markdown artifact and advance the lifecycle.
    ///
    /// The update is conditional on the current status so a replayed
    /// callback cannot regress a terminal state or duplicate the artifact:
    /// zero rows affected means the document was not in an accepting state.
    /// Returns the new status when the artifact was applied.
    pub async fn apply_markdown<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        markdown: &str,
    ) -> Result<Option<ResourceStatus>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(String,)> = sqlx::query_as(
            r"
            UPDATE documents
            SET processed_markdown = $3,
                status = CASE WHEN status = 'vectors_received' THEN 'ready'
                              ELSE 'markdown_received' END,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
              AND status IN ('processing', 'vectors_received')
            RETURNING status
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(markdown)
        .fetch_optional(executor)
        .await?;

        Ok(row.and_then(|(s,)| s.parse().ok()))
    }

    /// Advance the lifecycle after a validated vector batch was stored.
    ///
    /// Same conditional-update discipline as [`Document::apply_markdown`].
    pub async fn apply_vectors_received<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ResourceStatus>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(String,)> = sqlx::query_as(
            r"
            UPDATE documents
            SET status = CASE WHEN status = 'markdown_received' THEN 'ready'
                              ELSE 'vectors_received' END,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
              AND status IN ('processing', 'markdown_received')
            RETURNING status
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row.and_then(|(s,)| s.parse().ok()))
    }

    /// Move a non-terminal document to `failed`, persisting the error.
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
            UPDATE documents
            SET status = 'failed', error_message = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
              AND status NOT IN ('ready', 'failed', 'vectors_deleted')
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(error)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `ready` → `vectors_deleted` after a vector purge.
    pub async fn mark_vectors_deleted<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE documents
            SET status = 'vectors_deleted', updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'ready'
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_strings_fit_fixed_width_storage() {
        // The schema stores status as VARCHAR(20).
        for status in [
            ResourceStatus::Uploading,
            ResourceStatus::Processing,
            ResourceStatus::MarkdownReceived,
            ResourceStatus::VectorsReceived,
            ResourceStatus::Ready,
            ResourceStatus::Failed,
            ResourceStatus::VectorsDeleted,
        ] {
            assert!(
                status.to_string().len() <= 20,
                "{status} exceeds 20 characters"
            );
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ResourceStatus::Uploading,
            ResourceStatus::Processing,
            ResourceStatus::MarkdownReceived,
            ResourceStatus::VectorsReceived,
            ResourceStatus::Ready,
            ResourceStatus::Failed,
            ResourceStatus::VectorsDeleted,
        ] {
            let parsed = ResourceStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        use ResourceStatus::*;
        assert!(Uploading.can_transition_to(Processing));
        assert!(Processing.can_transition_to(MarkdownReceived));
        assert!(Processing.can_transition_to(VectorsReceived));
        assert!(MarkdownReceived.can_transition_to(Ready));
        assert!(VectorsReceived.can_transition_to(Ready));
        assert!(Ready.can_transition_to(VectorsDeleted));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        use ResourceStatus::*;
        assert!(Uploading.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Failed));
        assert!(MarkdownReceived.can_transition_to(Failed));
        assert!(VectorsReceived.can_transition_to(Failed));
        assert!(!Ready.can_transition_to(Failed));
        assert!(!VectorsDeleted.can_transition_to(Failed));
    }

    #[test]
    fn test_no_regression_from_terminal() {
        use ResourceStatus::*;
        assert!(!Ready.can_transition_to(MarkdownReceived));
        assert!(!Ready.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Ready));
    }

    #[test]
    fn test_reentry_is_allowed_for_idempotent_replays() {
        use ResourceStatus::*;
        assert!(Ready.can_transition_to(Ready));
        assert!(Processing.can_transition_to(Processing));
    }

    #[test]
    fn test_invalid_status_string_rejected() {
        assert!(ResourceStatus::from_str("READY").is_err());
        assert!(ResourceStatus::from_str("").is_err());
    }
}
