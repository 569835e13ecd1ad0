//! Strongly typed identifiers.
//!
//! Every entity in foliant is addressed by a UUID wrapped in a newtype, so
//! a `DocumentId` can never be passed where a `TenantId` is expected.
//!
//! # Example
//!
//! ```
//! use foliant_core::{TenantId, DocumentId};
//!
//! fn owned_by(tenant: TenantId) -> String {
//!     tenant.to_string()
//! }
//!
//! let tenant = TenantId::new();
//! let _doc = DocumentId::new();
//! let _ = owned_by(tenant);
//! // owned_by(_doc); // does not compile
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The underlying UUID parse error message.
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the underlying UUID by value.
            #[must_use]
            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier for a tenant, the isolation boundary every other entity is
    /// scoped to.
    TenantId
);

define_id!(
    /// Identifier for an ingested document.
    DocumentId
);

define_id!(
    /// Identifier for a chat exchange (one user message plus its reply).
    ExchangeId
);

define_id!(
    /// Identifier for a chat conversation grouping multiple exchanges.
    ConversationId
);

define_id!(
    /// Identifier for a connected streaming client.
    ClientId
);

define_id!(
    /// Identifier for a delivery record in the retry queue.
    DeliveryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_valid_uuid_string() {
        let id = TenantId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }

    #[test]
    fn test_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = DocumentId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(id.into_uuid(), uuid);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = ExchangeId::new();
        let parsed: ExchangeId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<TenantId>().unwrap_err();
        assert_eq!(err.id_type, "TenantId");
    }

    #[test]
    fn test_serde_transparent() {
        let id = DeliveryId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: DeliveryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_default_is_random() {
        assert_ne!(ClientId::default(), ClientId::default());
    }
}
