//! Role → permission table.
//!
//! The table is compiled-in configuration: built once at startup and handed to
//! the gate behind an `Arc`. Unknown roles map to the empty set.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::{Permission, Role};

static NO_PERMISSIONS: LazyLock<HashSet<Permission>> = LazyLock::new(HashSet::new);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    roles: HashMap<Role, HashSet<Permission>>,
}

impl PermissionTable {
    pub fn from_entries<R, P>(entries: impl IntoIterator<Item = (R, P)>) -> Self
    where
        R: Into<Role>,
        P: IntoIterator<Item = Permission>,
    {
        let roles = entries
            .into_iter()
            .map(|(role, perms)| (role.into(), perms.into_iter().collect()))
            .collect();
        Self { roles }
    }

    /// The clinic's eight roles.
    pub fn clinic_default() -> Self {
        Self::from_entries(
            CLINIC_ROLES
                .iter()
                .map(|(role, perms)| (Role::new(*role), perms.iter().map(|p| Permission::new(*p)))),
        )
    }

    /// Permissions held by `role`; empty for roles not in the table.
    pub fn permissions_for(&self, role: &str) -> &HashSet<Permission> {
        self.roles.get(role).unwrap_or(&NO_PERMISSIONS)
    }

    /// The set an unresolved or unknown role evaluates against.
    pub fn no_permissions() -> &'static HashSet<Permission> {
        &NO_PERMISSIONS
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Role names, sorted.
    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.keys().collect();
        roles.sort();
        roles
    }
}

const CLINIC_ROLES: &[(&str, &[&str])] = &[
    ("admin", &["*"]),
    (
        "medical_manager",
        &[
            "patients.read_all",
            "patients.write_all",
            "appointments.read_all",
            "appointments.write_all",
            "medical.read_all",
            "medical.write_all",
            "lab.read_all",
            "prescriptions.read_all",
            "kpi.manage",
            "reports.read",
            "inventory.read",
            "billing.read",
            "notifications.read",
        ],
    ),
    (
        "registrar",
        &[
            "patients.read_all",
            "patients.write_all",
            "appointments.read_all",
            "appointments.write_all",
            "notifications.read",
        ],
    ),
    (
        "doctor",
        &[
            "patients.read_assigned",
            "patients.write_assigned",
            "appointments.read_assigned",
            "appointments.write_assigned",
            "medical.read_assigned",
            "medical.write_assigned",
            "lab.read_assigned",
            "lab.write_assigned",
            "prescriptions.read_assigned",
            "prescriptions.write_assigned",
            "notifications.read",
        ],
    ),
    (
        "nurse",
        &[
            "patients.read_all",
            "appointments.read_all",
            "medical.read_all",
            "lab.read_all",
            "prescriptions.read_assigned",
            "prescriptions.write_assigned",
            "inventory.read",
            "notifications.read",
        ],
    ),
    (
        "lab_technician",
        &[
            "patients.read_all",
            "lab.read_all",
            "lab.write_all",
            "notifications.read",
        ],
    ),
    (
        "billing",
        &[
            "billing.manage",
            "billing.read",
            "patients.read_all",
            "appointments.read_all",
            "notifications.read",
        ],
    ),
    (
        "inventory_manager",
        &["inventory.manage", "inventory.read", "notifications.read"],
    ),
];
