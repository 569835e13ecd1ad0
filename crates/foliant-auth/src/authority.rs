//! The token authority service.
//!
//! Injected into handlers as a cloneable service object holding the pool;
//! all lookups are tenant- or resource-scoped and fail closed.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::{verify_token_hash, MintedToken};
use foliant_core::TenantId;
use foliant_db::models::{ChatExchange, Document, TenantToken};

/// Mints and verifies callback tokens against their stored hashes.
#[derive(Clone)]
pub struct TokenAuthority {
    pool: PgPool,
}

impl TokenAuthority {
    /// Create a new authority over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mint a resource-scoped token.
    ///
    /// The hash is handed back for the caller to store on the resource row
    /// it is about to create; the plaintext goes into the outbound payload.
    /// Resource tokens never expire so reprocessing can happen at arbitrary
    /// future times.
    #[must_use]
    pub fn mint_resource_token(&self) -> MintedToken {
        MintedToken::mint()
    }

    /// Rotate the tenant's single active token, returning the new plaintext.
    ///
    /// The prior token becomes invalid in the same statement.
    pub async fn rotate_tenant_token(&self, tenant_id: TenantId) -> Result<String, AuthError> {
        let minted = MintedToken::mint();
        TenantToken::upsert(&self.pool, tenant_id.into_uuid(), &minted.token_hash).await?;

        tracing::info!(
            target: "token_authority",
            tenant_id = %tenant_id,
            "Tenant token rotated"
        );

        Ok(minted.token)
    }

    /// Verify a tenant-scoped token.
    pub async fn verify_tenant_token(
        &self,
        tenant_id: TenantId,
        presented: &str,
    ) -> Result<(), AuthError> {
        let stored = TenantToken::find_by_tenant(&self.pool, tenant_id.into_uuid()).await?;

        match stored {
            Some(row) if verify_token_hash(presented, &row.token_hash) => Ok(()),
            _ => {
                tracing::warn!(
                    target: "token_authority",
                    tenant_id = %tenant_id,
                    "Tenant token verification failed"
                );
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Verify a document's resource-scoped token and the tenant named by
    /// the request payload.
    ///
    /// Returns the document on success so callers avoid a second lookup.
    /// Token mismatch is a 401; a valid token with a mismatched payload
    /// tenant is a 403 and logged as a tenant isolation event.
    pub async fn verify_document_token(
        &self,
        document_id: Uuid,
        claimed_tenant: TenantId,
        presented: &str,
    ) -> Result<Document, AuthError> {
        let doc = Document::find_for_callback(&self.pool, document_id)
            .await?
            .ok_or(AuthError::NotFound {
                resource: "Document",
            })?;

        if !verify_token_hash(presented, &doc.callback_token_hash) {
            tracing::warn!(
                target: "token_authority",
                document_id = %document_id,
                "Resource token verification failed"
            );
            return Err(AuthError::InvalidToken);
        }

        let owner = TenantId::from_uuid(doc.tenant_id);
        if owner != claimed_tenant {
            tracing::error!(
                target: "tenant_isolation",
                document_id = %document_id,
                owner_tenant = %owner,
                claimed_tenant = %claimed_tenant,
                "Tenant isolation violation on document callback"
            );
            return Err(AuthError::TenantMismatch {
                expected: owner,
                actual: claimed_tenant,
            });
        }

        Ok(doc)
    }

    /// Verify a chat exchange's resource-scoped token; same contract as
    /// [`TokenAuthority::verify_document_token`].
    pub async fn verify_exchange_token(
        &self,
        exchange_id: Uuid,
        claimed_tenant: TenantId,
        presented: &str,
    ) -> Result<ChatExchange, AuthError> {
        let exchange = ChatExchange::find_for_callback(&self.pool, exchange_id)
            .await?
            .ok_or(AuthError::NotFound {
                resource: "ChatExchange",
            })?;

        if !verify_token_hash(presented, &exchange.callback_token_hash) {
            tracing::warn!(
                target: "token_authority",
                exchange_id = %exchange_id,
                "Resource token verification failed"
            );
            return Err(AuthError::InvalidToken);
        }

        let owner = TenantId::from_uuid(exchange.tenant_id);
        if owner != claimed_tenant {
            tracing::error!(
                target: "tenant_isolation",
                exchange_id = %exchange_id,
                owner_tenant = %owner,
                claimed_tenant = %claimed_tenant,
                "Tenant isolation violation on chat callback"
            );
            return Err(AuthError::TenantMismatch {
                expected: owner,
                actual: claimed_tenant,
            });
        }

        Ok(exchange)
    }
}
