//! Multi-tenant traits.

use crate::ids::TenantId;

/// Trait for entities that belong to exactly one tenant.
///
/// Marking an entity `TenantScoped` lets generic callers verify ownership
/// without knowing the concrete type.
///
/// # Example
///
/// ```
/// use foliant_core::{TenantId, TenantScoped};
///
/// struct Document {
///     tenant_id: TenantId,
/// }
///
/// impl TenantScoped for Document {
///     fn tenant_id(&self) -> TenantId {
///         self.tenant_id
///     }
/// }
///
/// let tenant = TenantId::new();
/// let doc = Document { tenant_id: tenant };
/// assert!(doc.belongs_to(tenant));
/// ```
pub trait TenantScoped {
    /// The tenant that owns this entity.
    fn tenant_id(&self) -> TenantId;

    /// Returns true if this entity is owned by `tenant`.
    fn belongs_to(&self, tenant: TenantId) -> bool {
        self.tenant_id() == tenant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        tenant_id: TenantId,
    }

    impl TenantScoped for Row {
        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }
    }

    #[test]
    fn test_belongs_to() {
        let tenant = TenantId::new();
        let row = Row { tenant_id: tenant };
        assert!(row.belongs_to(tenant));
        assert!(!row.belongs_to(TenantId::new()));
    }

    #[test]
    fn test_object_safety() {
        let tenant = TenantId::new();
        let row: Box<dyn TenantScoped> = Box::new(Row { tenant_id: tenant });
        assert_eq!(row.tenant_id(), tenant);
    }
}
