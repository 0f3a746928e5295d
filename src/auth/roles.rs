//! Closed role enum and capability table.
//!
//! Access decisions are made by looking a role up in a static table, never by
//! ad-hoc string comparison at call sites.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Operator,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewBlocks,
    CreateBlocks,
    EditBlocks,
    UpdateDispatchStatus,
    CreateInvoices,
    ViewInvoices,
    ManageClients,
    ViewReports,
    ManageUsers,
}

/// Capability table, evaluated once per request by the auth middleware's
/// `AuthUser::can`.
pub fn capabilities(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        Role::Admin => &[
            ViewBlocks,
            CreateBlocks,
            EditBlocks,
            UpdateDispatchStatus,
            CreateInvoices,
            ViewInvoices,
            ManageClients,
            ViewReports,
            ManageUsers,
        ],
        Role::Manager => &[
            ViewBlocks,
            CreateBlocks,
            EditBlocks,
            UpdateDispatchStatus,
            CreateInvoices,
            ViewInvoices,
            ManageClients,
            ViewReports,
        ],
        Role::Operator => &[ViewBlocks, CreateBlocks, EditBlocks, UpdateDispatchStatus],
        Role::Viewer => &[ViewBlocks, ViewInvoices, ViewReports],
    }
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        capabilities(self).contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn admin_can_do_everything_viewer_can_read() {
        assert!(Role::Admin.can(Capability::ManageUsers));
        assert!(Role::Viewer.can(Capability::ViewBlocks));
        assert!(!Role::Viewer.can(Capability::CreateInvoices));
    }

    #[test]
    fn operator_cannot_bill_or_manage_users() {
        assert!(Role::Operator.can(Capability::UpdateDispatchStatus));
        assert!(!Role::Operator.can(Capability::CreateInvoices));
        assert!(!Role::Operator.can(Capability::ManageUsers));
    }

    #[test]
    fn only_admin_manages_users() {
        for role in [Role::Manager, Role::Operator, Role::Viewer] {
            assert!(!role.can(Capability::ManageUsers), "{role} must not manage users");
        }
    }

    #[test]
    fn roles_round_trip_as_strings() {
        assert_eq!(Role::Manager.to_string(), "manager");
        assert_eq!(Role::from_str("viewer").unwrap(), Role::Viewer);
        assert!(Role::from_str("superuser").is_err());
    }
}
