//! Integration tests for foliant-db.
//!
//! These tests require a running PostgreSQL instance with pgvector.
//! Run with: `cargo test -p foliant-db --features integration`

#![cfg(feature = "integration")]

mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use common::{seed_document, test_pool};
use foliant_db::models::{
    ChatExchange, CreateChatExchange, CreateDeliveryRecord, CreateVectorChunk,
    CreateVectorSearchLog, DeliveryRecord, DeliveryType, Document, ResourceStatus, TenantToken,
    VectorChunk, VectorSearchLog,
};

// ---------------------------------------------------------------------------
// Document lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_document_reaches_ready_after_both_artifacts() {
    let pool = test_pool().await;
    let doc = seed_document(&pool).await;

    Document::set_status(&pool, doc.tenant_id, doc.id, ResourceStatus::Processing)
        .await
        .unwrap();

    let after_markdown = Document::apply_markdown(&pool, doc.tenant_id, doc.id, "# Title")
        .await
        .unwrap();
    assert_eq!(after_markdown, Some(ResourceStatus::MarkdownReceived));

    let after_vectors = Document::apply_vectors_received(&pool, doc.tenant_id, doc.id)
        .await
        .unwrap();
    assert_eq!(after_vectors, Some(ResourceStatus::Ready));
}

#[tokio::test]
async fn test_markdown_replay_is_a_noop() {
    let pool = test_pool().await;
    let doc = seed_document(&pool).await;

    Document::set_status(&pool, doc.tenant_id, doc.id, ResourceStatus::Processing)
        .await
        .unwrap();
    Document::apply_markdown(&pool, doc.tenant_id, doc.id, "first")
        .await
        .unwrap();

    // The document is in markdown_received; a second markdown must not
    // apply or clobber the stored artifact.
    let replay = Document::apply_markdown(&pool, doc.tenant_id, doc.id, "second")
        .await
        .unwrap();
    assert_eq!(replay, None);

    let fetched = Document::find_by_id(&pool, doc.tenant_id, doc.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.processed_markdown.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_mark_failed_does_not_touch_ready_documents() {
    let pool = test_pool().await;
    let doc = seed_document(&pool).await;

    Document::set_status(&pool, doc.tenant_id, doc.id, ResourceStatus::Ready)
        .await
        .unwrap();

    let failed = Document::mark_failed(&pool, doc.tenant_id, doc.id, "late failure")
        .await
        .unwrap();
    assert!(!failed);

    let fetched = Document::find_by_id(&pool, doc.tenant_id, doc.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.status_enum(), Some(ResourceStatus::Ready));
}

#[tokio::test]
async fn test_vectors_deleted_only_from_ready() {
    let pool = test_pool().await;
    let doc = seed_document(&pool).await;

    assert!(!Document::mark_vectors_deleted(&pool, doc.tenant_id, doc.id)
        .await
        .unwrap());

    Document::set_status(&pool, doc.tenant_id, doc.id, ResourceStatus::Ready)
        .await
        .unwrap();
    assert!(Document::mark_vectors_deleted(&pool, doc.tenant_id, doc.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_find_by_id_is_tenant_scoped() {
    let pool = test_pool().await;
    let doc = seed_document(&pool).await;

    let other_tenant = Uuid::new_v4();
    let cross = Document::find_by_id(&pool, other_tenant, doc.id)
        .await
        .unwrap();
    assert!(cross.is_none());

    // The callback lookup intentionally ignores the tenant so the caller
    // can distinguish a mismatch (403) from an unknown id (404).
    let by_callback = Document::find_for_callback(&pool, doc.id).await.unwrap();
    assert!(by_callback.is_some());
}

// ---------------------------------------------------------------------------
// Chat exchanges
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reply_applies_once() {
    let pool = test_pool().await;
    let tenant_id = Uuid::new_v4();
    let exchange = ChatExchange::create(
        &pool,
        CreateChatExchange {
            tenant_id,
            conversation_id: Uuid::new_v4(),
            user_message: "hello".to_string(),
            callback_token_hash: "0".repeat(64),
        },
    )
    .await
    .unwrap();

    ChatExchange::set_status(&pool, tenant_id, exchange.id, ResourceStatus::Processing)
        .await
        .unwrap();

    assert!(ChatExchange::apply_reply(&pool, tenant_id, exchange.id, "hi")
        .await
        .unwrap());
    assert!(
        !ChatExchange::apply_reply(&pool, tenant_id, exchange.id, "hi again")
            .await
            .unwrap()
    );

    let fetched = ChatExchange::find_by_id(&pool, tenant_id, exchange.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.assistant_reply.as_deref(), Some("hi"));
    assert_eq!(fetched.status_enum(), Some(ResourceStatus::Ready));
}

// ---------------------------------------------------------------------------
// Delivery records
// ---------------------------------------------------------------------------

async fn seed_delivery(pool: &sqlx::PgPool, max_retries: i32) -> DeliveryRecord {
    DeliveryRecord::create(
        pool,
        CreateDeliveryRecord {
            tenant_id: Uuid::new_v4(),
            delivery_type: DeliveryType::DocumentProcessing,
            payload: json!({"action": "process_document"}),
            max_retries,
            next_retry_at: Utc::now() - Duration::seconds(1),
            last_error: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_claim_increments_retry_count_and_sets_retrying() {
    let pool = test_pool().await;
    let record = seed_delivery(&pool, 3).await;

    let claimed = DeliveryRecord::claim_due(&pool, 100).await.unwrap();
    let mine = claimed.iter().find(|r| r.id == record.id).unwrap();
    assert_eq!(mine.status, "retrying");
    assert_eq!(mine.retry_count, 1);
}

#[tokio::test]
async fn test_claim_skips_future_and_exhausted_records() {
    let pool = test_pool().await;

    let future = DeliveryRecord::create(
        &pool,
        CreateDeliveryRecord {
            tenant_id: Uuid::new_v4(),
            delivery_type: DeliveryType::ChatMessage,
            payload: json!({}),
            max_retries: 3,
            next_retry_at: Utc::now() + Duration::hours(1),
            last_error: None,
        },
    )
    .await
    .unwrap();

    let exhausted = seed_delivery(&pool, 1).await;
    let first = DeliveryRecord::claim_due(&pool, 100).await.unwrap();
    assert!(first.iter().any(|r| r.id == exhausted.id));
    // Put it back due but with no budget left.
    DeliveryRecord::reschedule(
        &pool,
        exhausted.id,
        Utc::now() - Duration::seconds(1),
        "boom",
    )
    .await
    .unwrap();

    let second = DeliveryRecord::claim_due(&pool, 100).await.unwrap();
    assert!(!second.iter().any(|r| r.id == exhausted.id));
    assert!(!second.iter().any(|r| r.id == future.id));
}

#[tokio::test]
async fn test_terminal_records_stay_terminal() {
    let pool = test_pool().await;
    let record = seed_delivery(&pool, 3).await;

    DeliveryRecord::mark_succeeded(&pool, record.id).await.unwrap();
    DeliveryRecord::mark_failed(&pool, record.id, "late").await.unwrap();

    let fetched = DeliveryRecord::find_by_id(&pool, record.tenant_id, record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.status, "succeeded");
    assert!(fetched.next_retry_at.is_none());
}

#[tokio::test]
async fn test_concurrent_claims_never_share_a_record() {
    let pool = test_pool().await;
    let record = seed_delivery(&pool, 3).await;

    let (a, b) = tokio::join!(
        DeliveryRecord::claim_due(&pool, 100),
        DeliveryRecord::claim_due(&pool, 100)
    );
    let a = a.unwrap();
    let b = b.unwrap();

    let in_a = a.iter().any(|r| r.id == record.id);
    let in_b = b.iter().any(|r| r.id == record.id);
    assert!(in_a != in_b, "record must be claimed by exactly one sweep");
}

// ---------------------------------------------------------------------------
// Tenant tokens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_token_rotation_replaces_hash() {
    let pool = test_pool().await;
    let tenant_id = Uuid::new_v4();

    TenantToken::upsert(&pool, tenant_id, &"a".repeat(64)).await.unwrap();
    TenantToken::upsert(&pool, tenant_id, &"b".repeat(64)).await.unwrap();

    let row = TenantToken::find_by_tenant(&pool, tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.token_hash, "b".repeat(64));
}

// ---------------------------------------------------------------------------
// Vector chunks and search log
// ---------------------------------------------------------------------------

fn embedding_of(dim: usize, value: f32) -> Vec<f32> {
    vec![value; dim]
}

#[tokio::test]
async fn test_vector_roundtrip_and_tenant_scoped_search() {
    let pool = test_pool().await;
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();
    let document_id = Uuid::new_v4();

    VectorChunk::insert(
        &pool,
        CreateVectorChunk {
            tenant_id: tenant_a,
            document_id,
            chunk_text: "alpha".to_string(),
            embedding: embedding_of(1536, 0.1),
            chunk_index: 0,
            metadata: json!({"page": 1}),
        },
    )
    .await
    .unwrap();

    let hits = VectorChunk::search(&pool, tenant_a, &embedding_of(1536, 0.1), 10)
        .await
        .unwrap();
    assert!(hits.iter().any(|h| h.document_id == document_id));

    let foreign = VectorChunk::search(&pool, tenant_b, &embedding_of(1536, 0.1), 10)
        .await
        .unwrap();
    assert!(!foreign.iter().any(|h| h.document_id == document_id));

    let removed = VectorChunk::delete_by_document(&pool, tenant_a, document_id)
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(
        VectorChunk::count_by_document(&pool, tenant_a, document_id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_search_log_records_failure_sentinel() {
    let pool = test_pool().await;
    let row = VectorSearchLog::create(
        &pool,
        CreateVectorSearchLog {
            tenant_id: Uuid::new_v4(),
            correlation_id: None,
            duration_ms: 12,
            result_count: foliant_db::models::vector_search_log::FAILED_SEARCH_SENTINEL,
            outcome: "error".to_string(),
            error: Some("index unavailable".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(row.result_count, -1);
    assert_eq!(row.outcome, "error");
}
