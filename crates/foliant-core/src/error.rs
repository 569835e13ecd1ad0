//! Standardized error taxonomy.
//!
//! Boundary errors (auth, tenant isolation, validation, not-found) are
//! handled where they occur and never retried; transient delivery failures
//! are owned by the retry scheduler and never surface here.

use crate::ids::TenantId;
use serde::Serialize;
use thiserror::Error;

/// Standardized error type shared across foliant services.
///
/// Each variant maps to one failure class from the delivery pipeline's
/// contract:
///
/// - `Unauthorized` - bad/missing/mismatched token (HTTP 401)
/// - `TenantMismatch` - valid credentials, wrong tenant (HTTP 403)
/// - `NotFound` - unknown resource or callback id (HTTP 404)
/// - `Validation` - malformed payload, wrong embedding dimension (HTTP 400)
/// - `Internal` - unexpected failure (HTTP 500)
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FoliantError {
    /// Authentication failure. Deliberately carries no detail about which
    /// check failed, to avoid oracle leaks.
    #[error("Unauthorized")]
    Unauthorized,

    /// Tenant isolation violation: the presented credential is valid but the
    /// payload names a different tenant. A security fault, not a business
    /// error; logged separately from plain auth failures.
    #[error("Tenant mismatch: expected {expected}, got {actual}")]
    TenantMismatch {
        /// The tenant that owns the resource.
        expected: TenantId,
        /// The tenant named by the request.
        actual: TenantId,
    },

    /// Requested resource was not found.
    #[error("{resource} not found{}", id.as_ref().map(|i| format!(": {i}")).unwrap_or_default())]
    NotFound {
        /// The type of resource (e.g. "Document", "Delivery").
        resource: String,
        /// Optional identifier of the resource.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Input validation failure.
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FoliantError {
    /// HTTP status code for this error class.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            FoliantError::Unauthorized => 401,
            FoliantError::TenantMismatch { .. } => 403,
            FoliantError::NotFound { .. } => 404,
            FoliantError::Validation { .. } => 400,
            FoliantError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for JSON responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            FoliantError::Unauthorized => "invalid_token",
            FoliantError::TenantMismatch { .. } => "tenant_mismatch",
            FoliantError::NotFound { .. } => "not_found",
            FoliantError::Validation { .. } => "validation_error",
            FoliantError::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for a not-found error.
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        FoliantError::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Convenience constructor for a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FoliantError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result alias using [`FoliantError`].
pub type Result<T> = std::result::Result<T, FoliantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_failure_classes() {
        assert_eq!(FoliantError::Unauthorized.http_status(), 401);
        assert_eq!(
            FoliantError::TenantMismatch {
                expected: TenantId::new(),
                actual: TenantId::new(),
            }
            .http_status(),
            403
        );
        assert_eq!(FoliantError::not_found("Document", None).http_status(), 404);
        assert_eq!(
            FoliantError::validation("embedding", "wrong dimension").http_status(),
            400
        );
        assert_eq!(FoliantError::Internal("boom".into()).http_status(), 500);
    }

    #[test]
    fn test_unauthorized_message_carries_no_detail() {
        assert_eq!(FoliantError::Unauthorized.to_string(), "Unauthorized");
    }

    #[test]
    fn test_not_found_display_with_id() {
        let err = FoliantError::not_found("Document", Some("abc".into()));
        assert_eq!(err.to_string(), "Document not found: abc");
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            FoliantError::Unauthorized.error_code(),
            FoliantError::TenantMismatch {
                expected: TenantId::new(),
                actual: TenantId::new(),
            }
            .error_code(),
            FoliantError::not_found("X", None).error_code(),
            FoliantError::validation("f", "m").error_code(),
            FoliantError::Internal("x".into()).error_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
