//! # Actor and Permissions
//!
//! The caller's identity arrives from the external auth/session collaborator
//! as an [`Actor`]. Engines call [`Actor::require`] before touching any
//! domain logic, so permission denials surface first, as `Unauthorized`.
//!
//! ## Permission Matrix
//! ```text
//! ┌────────────────────┬───────┬─────────┬────────┐
//! │ action             │ Admin │ Manager │ Seller │
//! ├────────────────────┼───────┼─────────┼────────┤
//! │ manage products    │   ✓   │    ✓    │        │
//! │ record sales       │   ✓   │    ✓    │   ✓    │
//! │ manage orders      │   ✓   │    ✓    │        │
//! │ manage clients     │   ✓   │    ✓    │   ✓    │
//! │ transfer stock     │   ✓   │    ✓    │        │
//! │ view reports       │   ✓   │    ✓    │   ✓    │
//! │ generate reports   │   ✓   │    ✓    │        │
//! │ manage settings    │   ✓   │         │        │
//! └────────────────────┴───────┴─────────┴────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Role
// =============================================================================

/// The caller's role within their business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Seller,
}

impl Role {
    /// Whether this role grants the given permission.
    pub fn permits(&self, permission: Permission) -> bool {
        use Permission::*;
        match self {
            Role::Admin => true,
            Role::Manager => !matches!(permission, ManageSettings),
            Role::Seller => matches!(
                permission,
                RecordSales | ManageClients | ViewReports
            ),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::Seller => write!(f, "seller"),
        }
    }
}

// =============================================================================
// Permission
// =============================================================================

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageProducts,
    RecordSales,
    ManageOrders,
    ManageClients,
    TransferStock,
    ViewReports,
    GenerateReports,
    ManageSettings,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::ManageProducts => write!(f, "manage products"),
            Permission::RecordSales => write!(f, "record sales"),
            Permission::ManageOrders => write!(f, "manage orders"),
            Permission::ManageClients => write!(f, "manage clients"),
            Permission::TransferStock => write!(f, "transfer stock"),
            Permission::ViewReports => write!(f, "view reports"),
            Permission::GenerateReports => write!(f, "generate reports"),
            Permission::ManageSettings => write!(f, "manage settings"),
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The authenticated caller: who they are, which business they act within,
/// and what their role lets them do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub business_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(
        user_id: impl Into<String>,
        business_id: impl Into<String>,
        role: Role,
    ) -> Self {
        Actor {
            user_id: user_id.into(),
            business_id: business_id.into(),
            role,
        }
    }

    /// Checks the permission, returning `Unauthorized` on denial.
    /// Engines call this before any domain logic.
    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        if self.role.permits(permission) {
            Ok(())
        } else {
            Err(CoreError::Unauthorized {
                role: self.role.to_string(),
                action: permission.to_string(),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_everything() {
        for p in [
            Permission::ManageProducts,
            Permission::RecordSales,
            Permission::ManageOrders,
            Permission::ManageClients,
            Permission::TransferStock,
            Permission::ViewReports,
            Permission::GenerateReports,
            Permission::ManageSettings,
        ] {
            assert!(Role::Admin.permits(p));
        }
    }

    #[test]
    fn test_manager_everything_but_settings() {
        assert!(Role::Manager.permits(Permission::ManageOrders));
        assert!(Role::Manager.permits(Permission::GenerateReports));
        assert!(!Role::Manager.permits(Permission::ManageSettings));
    }

    #[test]
    fn test_seller_scope() {
        assert!(Role::Seller.permits(Permission::RecordSales));
        assert!(Role::Seller.permits(Permission::ViewReports));
        assert!(Role::Seller.permits(Permission::ManageClients));
        assert!(!Role::Seller.permits(Permission::ManageOrders));
        assert!(!Role::Seller.permits(Permission::TransferStock));
        assert!(!Role::Seller.permits(Permission::GenerateReports));
    }

    #[test]
    fn test_require_surfaces_role_and_action() {
        let seller = Actor::new("usr-1", "biz-1", Role::Seller);
        assert!(seller.require(Permission::RecordSales).is_ok());

        let err = seller.require(Permission::ManageOrders).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Role seller is not permitted to manage orders"
        );
    }
}
