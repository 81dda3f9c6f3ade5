use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{RoleId, UserId};

use crate::Role;

/// The authenticated user for the current request.
///
/// `role_name` is resolved lazily from the role registry and cached on the
/// principal for the lifetime of the session; `role_resolved_at` records when
/// that happened so the session guard can decide whether the cache is stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role_id: RoleId,
    #[serde(default)]
    pub role_name: Option<Role>,
    #[serde(default)]
    pub role_resolved_at: Option<DateTime<Utc>>,
}

impl Principal {
    /// A freshly authenticated principal whose role name is not yet known.
    pub fn new(id: UserId, role_id: RoleId) -> Self {
        Self {
            id,
            role_id,
            role_name: None,
            role_resolved_at: None,
        }
    }

    /// A principal with an already-known role name (e.g. restored from a login flow).
    pub fn with_role(id: UserId, role_id: RoleId, role_name: Role, resolved_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role_id,
            role_name: Some(role_name),
            role_resolved_at: Some(resolved_at),
        }
    }

    pub fn role(&self) -> Option<&Role> {
        self.role_name.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.role_name.as_ref().is_some_and(Role::is_admin)
    }
}

/// Per-request identity session.
///
/// Holds the principal (if anyone is logged in) for one request-processing
/// context. The session guard may replace the principal with a hydrated copy;
/// callers persist it back to their store when [`Session::is_modified`] is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    principal: Option<Principal>,
    modified: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            modified: false,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Swap in a new principal; marks the session modified only on change.
    pub fn replace_principal(&mut self, principal: Principal) {
        if self.principal.as_ref() != Some(&principal) {
            self.principal = Some(principal);
            self.modified = true;
        }
    }

    pub fn logout(&mut self) {
        if self.principal.take().is_some() {
            self.modified = true;
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }
}
