//! Vector chunk entity model.
//!
//! Chunks are insert-only and bulk-deleted by (tenant, document). The
//! embedding lives in a pgvector column; it is written via a `::vector`
//! cast from the canonical `[x,y,...]` text form and never read back, so no
//! pgvector driver binding is needed.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A stored vector chunk (embedding column omitted; it is never selected).
#[derive(Debug, Clone, FromRow)]
pub struct VectorChunk {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub chunk_text: String,
    pub chunk_index: i32,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting one validated chunk.
#[derive(Debug, Clone)]
pub struct CreateVectorChunk {
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub chunk_index: i32,
    pub metadata: JsonValue,
}

/// One similarity search result row.
#[derive(Debug, Clone, FromRow)]
pub struct VectorSearchHit {
    pub document_id: Uuid,
    pub chunk_text: String,
    pub chunk_index: i32,
    pub metadata: JsonValue,
    /// Cosine distance to the query embedding (smaller is closer).
    pub distance: f64,
}

/// Render an embedding in pgvector's text form: `[0.1,0.2,...]`.
#[must_use]
pub fn embedding_literal(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{v}"));
    }
    out.push(']');
    out
}

impl VectorChunk {
    /// Insert one chunk. Callers validate the embedding dimension first.
    pub async fn insert<'e, E>(executor: E, input: CreateVectorChunk) -> Result<Uuid, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (id,): (Uuid,) = sqlx::query_as(
            r"
            INSERT INTO vector_chunks
                (tenant_id, document_id, chunk_text, embedding, chunk_index, metadata)
            VALUES ($1, $2, $3, $4::vector, $5, $6)
            RETURNING id
            ",
        )
        .bind(input.tenant_id)
        .bind(input.document_id)
        .bind(input.chunk_text)
        .bind(embedding_literal(&input.embedding))
        .bind(input.chunk_index)
        .bind(input.metadata)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    /// Bulk-delete all chunks for a document. Returns the number removed.
    pub async fn delete_by_document<'e, E>(
        executor: E,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            DELETE FROM vector_chunks
            WHERE tenant_id = $1 AND document_id = $2
            ",
        )
        .bind(tenant_id)
        .bind(document_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Count chunks stored for a document.
    pub async fn count_by_document<'e, E>(
        executor: E,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM vector_chunks
            WHERE tenant_id = $1 AND document_id = $2
            ",
        )
        .bind(tenant_id)
        .bind(document_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Tenant-scoped cosine similarity search.
    pub async fn search<'e, E>(
        executor: E,
        tenant_id: Uuid,
        query_embedding: &[f32],
        limit: i64,
    ) -> Result<Vec<VectorSearchHit>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, VectorSearchHit>(
            r"
            SELECT document_id, chunk_text, chunk_index, metadata,
                   (embedding <=> $2::vector)::float8 AS distance
            FROM vector_chunks
            WHERE tenant_id = $1
            ORDER BY embedding <=> $2::vector
            LIMIT $3
            ",
        )
        .bind(tenant_id)
        .bind(embedding_literal(query_embedding))
        .bind(limit)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_literal_format() {
        assert_eq!(embedding_literal(&[1.0, 2.5, -0.25]), "[1,2.5,-0.25]");
    }

    #[test]
    fn test_embedding_literal_empty() {
        assert_eq!(embedding_literal(&[]), "[]");
    }

    #[test]
    fn test_embedding_literal_single() {
        assert_eq!(embedding_literal(&[0.125]), "[0.125]");
    }
}
