use std::collections::HashMap;
use std::sync::RwLock;

use clinic_auth::{PermissionTable, RegistryError, Role, RoleRecord, RoleRegistry};
use clinic_core::RoleId;

/// In-memory role registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRoleRegistry {
    roles: RwLock<HashMap<RoleId, RoleRecord>>,
}

impl InMemoryRoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One row per role in `table`, numbered from 1 in sorted name order.
    pub fn from_table(table: &PermissionTable) -> Self {
        let roles = table
            .roles()
            .into_iter()
            .zip(1..)
            .map(|(name, id)| {
                let id = RoleId::new(id);
                (id, RoleRecord { id, name: name.clone() })
            })
            .collect();
        Self {
            roles: RwLock::new(roles),
        }
    }

    pub fn insert(&self, id: RoleId, name: Role) -> Result<(), RegistryError> {
        self.roles
            .write()
            .map_err(|_| poisoned())?
            .insert(id, RoleRecord { id, name });
        Ok(())
    }

    pub fn id_of(&self, name: &str) -> Result<Option<RoleId>, RegistryError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.values().find(|r| r.name.as_str() == name).map(|r| r.id))
    }
}

impl RoleRegistry for InMemoryRoleRegistry {
    fn find_by_id(&self, role_id: RoleId) -> Result<Option<RoleRecord>, RegistryError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.get(&role_id).cloned())
    }
}

fn poisoned() -> RegistryError {
    RegistryError::Unavailable("role registry lock poisoned".to_string())
}
