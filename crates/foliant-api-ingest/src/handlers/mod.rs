//! HTTP handlers, one module per surface.

pub mod callbacks;
pub mod chat;
pub mod deliveries;
pub mod documents;
pub mod search;
pub mod stream;
pub mod tenants;

use axum::http::HeaderMap;

use crate::error::ApiError;

/// Tenant-scoped bearer token header.
pub const TENANT_TOKEN_HEADER: &str = "x-tenant-token";

/// Resource-scoped callback token header.
pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Vector callback token header; named separately so a processor can never
/// accidentally present a markdown token on the vector path.
pub const VECTOR_CALLBACK_TOKEN_HEADER: &str = "x-vector-callback-token";

/// Search token header.
pub const SEARCH_TOKEN_HEADER: &str = "x-search-token";

/// Tenant id header for endpoints whose body carries no tenant.
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Pull a required token header, failing closed on absence or bad bytes.
pub(crate) fn require_header<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_require_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_TOKEN_HEADER, HeaderValue::from_static("tok"));
        assert_eq!(require_header(&headers, TENANT_TOKEN_HEADER).unwrap(), "tok");
    }

    #[test]
    fn test_require_header_missing_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_header(&headers, CALLBACK_TOKEN_HEADER),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_require_header_non_utf8_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CALLBACK_TOKEN_HEADER,
            HeaderValue::from_bytes(&[0xfe, 0xff]).unwrap(),
        );
        assert!(require_header(&headers, CALLBACK_TOKEN_HEADER).is_err());
    }
}
