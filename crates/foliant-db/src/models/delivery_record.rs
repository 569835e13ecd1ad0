//! Delivery record entity model: the durable retry queue.
//!
//! One row tracks one outbound event's transmission state. The retry
//! scheduler claims due rows with a single conditional UPDATE so that two
//! concurrent sweeps can never double-process a record, and an incremented
//! `retry_count` survives a scheduler crash mid-sweep.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use foliant_core::{TenantId, TenantScoped};

/// Transmission state of a delivery record.
///
/// `Succeeded` and `Failed` are terminal: the scheduler never touches a
/// record again once it reaches either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Waiting for its `next_retry_at` to come due.
    Pending,
    /// Claimed by a sweep; an attempt is in flight.
    Retrying,
    /// Delivered. Terminal.
    Succeeded,
    /// Retry budget exhausted. Terminal (dead-letter equivalent).
    Failed,
}

impl DeliveryStatus {
    /// True for states the scheduler ignores.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Succeeded | DeliveryStatus::Failed)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Retrying => "retrying",
            DeliveryStatus::Succeeded => "succeeded",
            DeliveryStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "retrying" => Ok(DeliveryStatus::Retrying),
            "succeeded" => Ok(DeliveryStatus::Succeeded),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("Invalid delivery status: {other}")),
        }
    }
}

/// What kind of resource the delivery was initiated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryType {
    /// Document processing request.
    DocumentProcessing,
    /// Chat message processing request.
    ChatMessage,
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryType::DocumentProcessing => "document_processing",
            DeliveryType::ChatMessage => "chat_message",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document_processing" => Ok(DeliveryType::DocumentProcessing),
            "chat_message" => Ok(DeliveryType::ChatMessage),
            other => Err(format!("Invalid delivery type: {other}")),
        }
    }
}

/// A delivery record row.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRecord {
    /// Surrogate id.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Delivery type tag (see [`DeliveryType`]).
    pub delivery_type: String,
    /// Serialized outbound payload.
    pub payload: JsonValue,
    /// Transmission state (see [`DeliveryStatus`]).
    pub status: String,
    /// Number of attempts made so far. Never exceeds `max_retries`.
    pub retry_count: i32,
    /// Retry budget.
    pub max_retries: i32,
    /// When the next attempt is due (NULL once terminal).
    pub next_retry_at: Option<DateTime<Utc>>,
    /// Error captured from the most recent failed attempt.
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a delivery record.
#[derive(Debug, Clone)]
pub struct CreateDeliveryRecord {
    pub tenant_id: Uuid,
    pub delivery_type: DeliveryType,
    pub payload: JsonValue,
    pub max_retries: i32,
    pub next_retry_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl TenantScoped for DeliveryRecord {
    fn tenant_id(&self) -> TenantId {
        TenantId::from_uuid(self.tenant_id)
    }
}

impl DeliveryRecord {
    /// Parsed transmission state.
    #[must_use]
    pub fn status_enum(&self) -> Option<DeliveryStatus> {
        self.status.parse().ok()
    }

    /// Parsed delivery type.
    #[must_use]
    pub fn delivery_type_enum(&self) -> Option<DeliveryType> {
        self.delivery_type.parse().ok()
    }

    /// Create a pending delivery record.
    pub async fn create<'e, E>(
        executor: E,
        input: CreateDeliveryRecord,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO delivery_records
                (tenant_id, delivery_type, payload, status, retry_count,
                 max_retries, next_retry_at, last_error)
            VALUES ($1, $2, $3, 'pending', 0, $4, $5, $6)
            RETURNING id, tenant_id, delivery_type, payload, status, retry_count,
                      max_retries, next_retry_at, last_error, created_at, updated_at
            ",
        )
        .bind(input.tenant_id)
        .bind(input.delivery_type.to_string())
        .bind(input.payload)
        .bind(input.max_retries)
        .bind(input.next_retry_at)
        .bind(input.last_error)
        .fetch_one(executor)
        .await
    }

    /// Atomically claim up to `batch` due records for one sweep.
    ///
    /// A record is due when its status is pending or retrying, its
    /// `next_retry_at` has passed, and it still has retry budget. Claiming
    /// sets status to `retrying` and increments `retry_count` in the same
    /// statement; `FOR UPDATE SKIP LOCKED` keeps concurrent sweeps off the
    /// same rows. Oldest-due rows are claimed first.
    pub async fn claim_due<'e, E>(executor: E, batch: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            UPDATE delivery_records
            SET status = 'retrying', retry_count = retry_count + 1, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM delivery_records
                WHERE status IN ('pending', 'retrying')
                  AND next_retry_at <= NOW()
                  AND retry_count < max_retries
                ORDER BY next_retry_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, tenant_id, delivery_type, payload, status, retry_count,
                      max_retries, next_retry_at, last_error, created_at, updated_at
            ",
        )
        .bind(batch)
        .fetch_all(executor)
        .await
    }

    /// Mark a delivery succeeded. Terminal; clears the schedule.
    pub async fn mark_succeeded<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE delivery_records
            SET status = 'succeeded', next_retry_at = NULL, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('succeeded', 'failed')
            ",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Put a failed attempt back in the queue with its next due time.
    pub async fn reschedule<'e, E>(
        executor: E,
        id: Uuid,
        next_retry_at: DateTime<Utc>,
        last_error: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE delivery_records
            SET status = 'pending', next_retry_at = $2, last_error = $3, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('succeeded', 'failed')
            ",
        )
        .bind(id)
        .bind(next_retry_at)
        .bind(last_error)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Mark a delivery permanently failed. Terminal; no further schedule.
    pub async fn mark_failed<'e, E>(
        executor: E,
        id: Uuid,
        last_error: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE delivery_records
            SET status = 'failed', next_retry_at = NULL, last_error = $2, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('succeeded', 'failed')
            ",
        )
        .bind(id)
        .bind(last_error)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// List a tenant's delivery records, newest first.
    pub async fn list_by_tenant<'e, E>(
        executor: E,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
        status: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, delivery_type, payload, status, retry_count,
                   max_retries, next_retry_at, last_error, created_at, updated_at
            FROM delivery_records
            WHERE tenant_id = $1 AND ($4::text IS NULL OR status = $4)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .bind(status)
        .fetch_all(executor)
        .await
    }

    /// Fetch one delivery record scoped to its tenant.
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
            SELECT id, tenant_id, delivery_type, payload, status, retry_count,
                   max_retries, next_retry_at, last_error, created_at, updated_at
            FROM delivery_records
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            DeliveryStatus::Pending,
            DeliveryStatus::Retrying,
            DeliveryStatus::Succeeded,
            DeliveryStatus::Failed,
        ] {
            assert_eq!(
                DeliveryStatus::from_str(&status.to_string()).unwrap(),
                status
            );
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(DeliveryStatus::Succeeded.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(!DeliveryStatus::Retrying.is_terminal());
    }

    #[test]
    fn test_delivery_type_roundtrip() {
        for ty in [DeliveryType::DocumentProcessing, DeliveryType::ChatMessage] {
            assert_eq!(DeliveryType::from_str(&ty.to_string()).unwrap(), ty);
        }
        assert!(DeliveryType::from_str("csv_import").is_err());
    }
}
