//! Error types for the foliant-db crate.

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation failed before the query was issued.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl DbError {
    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }

    /// True when the underlying failure suggests the pgvector extension or
    /// the vector index is unavailable rather than a bad query.
    #[must_use]
    pub fn is_vector_backend_error(&self) -> bool {
        match self {
            DbError::QueryFailed(e) => {
                let msg = e.to_string().to_lowercase();
                msg.contains("vector") && (msg.contains("does not exist") || msg.contains("type"))
            }
            _ => false,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::ConnectionFailed(e)
            }
            other => DbError::QueryFailed(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn test_pool_closed_is_connection_error() {
        let err = DbError::from(sqlx::Error::PoolClosed);
        assert!(err.is_connection_error());
    }
}
