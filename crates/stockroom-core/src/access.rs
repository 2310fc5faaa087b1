//! # Access Policy
//!
//! Which back-office roles may perform which operations. The HTTP layer
//! checks [`Role::allows`] before calling into a repository.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// A back-office user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

/// An operation gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageUsers,
    /// Products, custom fields, categories.
    ManageCatalog,
    ManageStores,
    ManageBatches,
    AdmitInventory,
    ViewInventory,
    UpdateInventoryStatus,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Admin => true,
            Role::Manager => !matches!(permission, ManageUsers),
            Role::Staff => matches!(
                permission,
                AdmitInventory | ViewInventory | UpdateInventoryStatus
            ),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "manager".into(), "staff".into()],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Permission; 7] = [
        Permission::ManageUsers,
        Permission::ManageCatalog,
        Permission::ManageStores,
        Permission::ManageBatches,
        Permission::AdmitInventory,
        Permission::ViewInventory,
        Permission::UpdateInventoryStatus,
    ];

    #[test]
    fn test_admin_allows_everything() {
        assert!(ALL.iter().all(|p| Role::Admin.allows(*p)));
    }

    #[test]
    fn test_manager_cannot_manage_users() {
        assert!(!Role::Manager.allows(Permission::ManageUsers));
        assert!(Role::Manager.allows(Permission::ManageBatches));
        assert!(Role::Manager.allows(Permission::ManageCatalog));
        assert!(Role::Manager.allows(Permission::AdmitInventory));
    }

    #[test]
    fn test_staff_only_touches_inventory() {
        let allowed: Vec<_> = ALL.iter().filter(|p| Role::Staff.allows(**p)).collect();
        assert_eq!(
            allowed,
            vec![
                &Permission::AdmitInventory,
                &Permission::ViewInventory,
                &Permission::UpdateInventoryStatus
            ]
        );
    }

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(Role::Staff.to_string(), "staff");
        assert!("owner".parse::<Role>().is_err());
    }
}
