//! # foliant-auth
//!
//! The token authority: mints and verifies the callback tokens that scope
//! every inbound and outbound callback to exactly one tenant and one
//! resource.
//!
//! Two scopes exist:
//!
//! - **tenant-scope** — one active token per tenant, rotated on demand,
//!   used for tenant-wide operations (knowledge search, streaming, delivery
//!   inspection). Rotation invalidates the prior token immediately.
//! - **resource-scope** — one permanent token per document or chat
//!   exchange, minted at submit time and handed to the external processor,
//!   valid only for the exact (tenant, resource) pair.
//!
//! Tokens are 256-bit random values stored as SHA-256 hashes and compared
//! in constant time. Verification fails closed: a caller learns only the
//! failure class (invalid credential vs. tenant mismatch), never which
//! check tripped.

mod authority;
mod error;
mod token;

pub use authority::TokenAuthority;
pub use error::AuthError;
pub use token::{generate_secure_token, hash_token, verify_token_hash, MintedToken};
