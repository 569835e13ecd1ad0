//! Foliant Core Library
//!
//! Shared types and traits for foliant services.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`TenantId`, `DocumentId`, ...)
//! - [`traits`] - Multi-tenant traits (`TenantScoped`)
//! - [`error`] - Standardized error taxonomy (`FoliantError`)

pub mod error;
pub mod ids;
pub mod traits;

pub use error::{FoliantError, Result};
pub use ids::{ClientId, ConversationId, DeliveryId, DocumentId, ExchangeId, TenantId};
pub use traits::TenantScoped;
