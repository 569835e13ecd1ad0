//! Error types for the ingest API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use foliant_auth::AuthError;
use foliant_db::DbError;

/// Ingest API error variants.
///
/// The auth failure classes stay distinct end to end: a bad token is 401,
/// a valid token presented against another tenant's resource is 403.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Tenant mismatch")]
    TenantMismatch,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Vector index unavailable: pgvector extension missing")]
    IndexUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON error response returned by ingest API endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid_token"),
            ApiError::TenantMismatch => (StatusCode::FORBIDDEN, "tenant_mismatch"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::IndexUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "index_unavailable"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken => ApiError::Unauthorized,
            AuthError::TenantMismatch { .. } => ApiError::TenantMismatch,
            AuthError::NotFound { resource } => ApiError::NotFound(resource),
            AuthError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if e.is_vector_backend_error() {
            return ApiError::IndexUnavailable;
        }
        match e {
            DbError::NotFound(_) => ApiError::NotFound("Resource"),
            DbError::ValidationFailed(message) => ApiError::Validation(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use foliant_core::TenantId;

    #[test]
    fn test_auth_error_mapping_keeps_classes_distinct() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidToken),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(AuthError::TenantMismatch {
                expected: TenantId::new(),
                actual: TenantId::new(),
            }),
            ApiError::TenantMismatch
        ));
    }

    #[test]
    fn test_index_unavailable_names_the_extension() {
        assert!(ApiError::IndexUnavailable
            .to_string()
            .contains("pgvector extension missing"));
    }
}
