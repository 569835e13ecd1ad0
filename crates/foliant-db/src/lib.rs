//! # foliant-db
//!
//! PostgreSQL persistence layer for foliant.
//!
//! Every table carries a `tenant_id` column and every query method takes the
//! tenant explicitly; nothing in this crate can read across tenants except
//! the callback-path lookups that exist precisely to detect a tenant
//! mismatch and report it as a security fault.
//!
//! Model structs follow one pattern: a `FromRow` struct per table plus
//! static async methods generic over [`sqlx::PgExecutor`], so callers can
//! pass either a pool or an open transaction.

pub mod error;
pub mod models;

pub use error::DbError;

/// Connection pool alias used across foliant services.
pub type DbPool = sqlx::PgPool;
