//! Error types for the token authority.

use foliant_core::TenantId;
use thiserror::Error;

/// Verification and minting failures.
///
/// `InvalidToken` and `TenantMismatch` are distinct failure classes (401 vs
/// 403) and are logged under different events for security review; they must
/// not be conflated.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad, missing, or mismatched token. Carries no detail on purpose.
    #[error("Unauthorized")]
    InvalidToken,

    /// The credential is valid but the request names a different tenant
    /// from the one owning the resource. A security fault.
    #[error("Tenant mismatch: resource belongs to {expected}, request claimed {actual}")]
    TenantMismatch {
        expected: TenantId,
        actual: TenantId,
    },

    /// Unknown resource or callback id.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuthError {
    /// HTTP status for this failure class.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::InvalidToken => 401,
            AuthError::TenantMismatch { .. } => 403,
            AuthError::NotFound { .. } => 404,
            AuthError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_token_says_nothing() {
        assert_eq!(AuthError::InvalidToken.to_string(), "Unauthorized");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::InvalidToken.http_status(), 401);
        assert_eq!(
            AuthError::TenantMismatch {
                expected: TenantId::new(),
                actual: TenantId::new()
            }
            .http_status(),
            403
        );
        assert_eq!(
            AuthError::NotFound {
                resource: "Document"
            }
            .http_status(),
            404
        );
    }
}
