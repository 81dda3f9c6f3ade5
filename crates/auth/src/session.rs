//! Session hydration guard.
//!
//! Precondition of every gate call: a principal must be present, and its role
//! name is resolved from the role registry the first time it is needed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use clinic_core::RoleId;

use crate::{AuthzError, Principal, RoleRecord, Session};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("role registry unavailable: {0}")]
    Unavailable(String),
}

/// Maps a role id to its role row.
pub trait RoleRegistry: Send + Sync {
    fn find_by_id(&self, role_id: RoleId) -> Result<Option<RoleRecord>, RegistryError>;
}

/// How long a resolved role name is trusted before it is looked up again.
///
/// `role_name_ttl: None` never re-resolves: a role renamed mid-session keeps
/// its old name on the principal until the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrationPolicy {
    pub role_name_ttl: Option<Duration>,
}

impl HydrationPolicy {
    pub const DEFAULT_TTL_SECS: i64 = 15 * 60;

    pub fn never_expire() -> Self {
        Self { role_name_ttl: None }
    }

    pub fn expire_after(ttl: Duration) -> Self {
        Self {
            role_name_ttl: Some(ttl),
        }
    }

    fn is_fresh(&self, principal: &Principal, now: DateTime<Utc>) -> bool {
        if principal.role_name.is_none() {
            return false;
        }
        match (self.role_name_ttl, principal.role_resolved_at) {
            (None, _) => true,
            (Some(ttl), Some(resolved_at)) => now - resolved_at < ttl,
            (Some(_), None) => false,
        }
    }
}

impl Default for HydrationPolicy {
    fn default() -> Self {
        Self::expire_after(Duration::seconds(Self::DEFAULT_TTL_SECS))
    }
}

#[derive(Clone)]
pub struct SessionGuard {
    registry: Arc<dyn RoleRegistry>,
    policy: HydrationPolicy,
}

impl SessionGuard {
    pub fn new(registry: Arc<dyn RoleRegistry>, policy: HydrationPolicy) -> Self {
        Self { registry, policy }
    }

    /// Ensure a principal is present and its role name resolved.
    ///
    /// Writes the hydrated principal back into `session`. Calling this again
    /// on a fresh, hydrated principal performs no registry lookup.
    pub fn check<'s>(&self, session: &'s mut Session, now: DateTime<Utc>) -> Result<&'s Principal, AuthzError> {
        let Some(current) = session.principal() else {
            tracing::debug!("no principal in session");
            return Err(AuthzError::Unauthenticated);
        };

        if !self.policy.is_fresh(current, now) {
            let hydrated = self.hydrate(current, now);
            session.replace_principal(hydrated);
        }

        session.principal().ok_or(AuthzError::Unauthenticated)
    }

    /// Resolve the role name for `principal`, returning the updated copy.
    ///
    /// On a registry miss or failure the principal comes back without a role
    /// name, which the gate treats as an unknown role (deny-by-default).
    pub fn hydrate(&self, principal: &Principal, now: DateTime<Utc>) -> Principal {
        if self.policy.is_fresh(principal, now) {
            return principal.clone();
        }

        let mut hydrated = principal.clone();
        match self.registry.find_by_id(principal.role_id) {
            Ok(Some(record)) => {
                if let Some(previous) = &principal.role_name
                    && previous != &record.name
                {
                    tracing::info!(
                        principal_id = %principal.id,
                        role_id = %principal.role_id,
                        previous = %previous,
                        current = %record.name,
                        "role renamed since last resolution"
                    );
                }
                hydrated.role_name = Some(record.name);
                hydrated.role_resolved_at = Some(now);
            }
            Ok(None) => {
                tracing::warn!(
                    principal_id = %principal.id,
                    role_id = %principal.role_id,
                    "role id not found in registry"
                );
                hydrated.role_name = None;
                hydrated.role_resolved_at = None;
            }
            Err(e) => {
                tracing::warn!(
                    principal_id = %principal.id,
                    role_id = %principal.role_id,
                    error = %e,
                    "role registry lookup failed"
                );
            }
        }
        hydrated
    }
}

impl core::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionGuard").field("policy", &self.policy).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use clinic_core::UserId;

    use super::*;
    use crate::Role;

    #[derive(Default)]
    struct CountingRegistry {
        names: Mutex<HashMap<RoleId, &'static str>>,
        lookups: Mutex<usize>,
        fail: bool,
    }

    impl CountingRegistry {
        fn with(entries: &[(i64, &'static str)]) -> Self {
            Self {
                names: Mutex::new(entries.iter().map(|(id, n)| (RoleId::new(*id), *n)).collect()),
                ..Default::default()
            }
        }

        fn rename(&self, id: i64, name: &'static str) {
            self.names.lock().unwrap().insert(RoleId::new(id), name);
        }

        fn lookups(&self) -> usize {
            *self.lookups.lock().unwrap()
        }
    }

    impl RoleRegistry for CountingRegistry {
        fn find_by_id(&self, role_id: RoleId) -> Result<Option<RoleRecord>, RegistryError> {
            *self.lookups.lock().unwrap() += 1;
            if self.fail {
                return Err(RegistryError::Unavailable("db down".into()));
            }
            Ok(self.names.lock().unwrap().get(&role_id).map(|name| RoleRecord {
                id: role_id,
                name: Role::new(*name),
            }))
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn doctor_session() -> Session {
        Session::authenticated(Principal::new(UserId::new(3), RoleId::new(4)))
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        let guard = SessionGuard::new(Arc::new(CountingRegistry::default()), HydrationPolicy::default());
        let mut session = Session::anonymous();
        assert_eq!(guard.check(&mut session, t0()), Err(AuthzError::Unauthenticated));
    }

    #[test]
    fn check_resolves_role_name_once() {
        let registry = Arc::new(CountingRegistry::with(&[(4, "doctor")]));
        let guard = SessionGuard::new(registry.clone(), HydrationPolicy::never_expire());
        let mut session = doctor_session();

        let role = guard.check(&mut session, t0()).unwrap().role_name.clone();
        assert_eq!(role, Some(Role::new("doctor")));
        assert!(session.is_modified());

        let before = session.clone();
        guard.check(&mut session, t0() + Duration::days(30)).unwrap();
        assert_eq!(session, before);
        assert_eq!(registry.lookups(), 1);
    }

    #[test]
    fn stale_role_name_is_re_resolved_after_ttl() {
        let registry = Arc::new(CountingRegistry::with(&[(4, "doctor")]));
        let guard = SessionGuard::new(registry.clone(), HydrationPolicy::expire_after(Duration::minutes(10)));
        let mut session = doctor_session();

        guard.check(&mut session, t0()).unwrap();
        registry.rename(4, "medical_manager");

        let p = guard.check(&mut session, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(p.role_name, Some(Role::new("doctor")));

        let p = guard.check(&mut session, t0() + Duration::minutes(11)).unwrap();
        assert_eq!(p.role_name, Some(Role::new("medical_manager")));
        assert_eq!(registry.lookups(), 2);
    }

    #[test]
    fn never_expire_keeps_stale_name() {
        let registry = Arc::new(CountingRegistry::with(&[(4, "doctor")]));
        let guard = SessionGuard::new(registry.clone(), HydrationPolicy::never_expire());
        let mut session = doctor_session();

        guard.check(&mut session, t0()).unwrap();
        registry.rename(4, "nurse");
        let p = guard.check(&mut session, t0() + Duration::days(1)).unwrap();
        assert_eq!(p.role_name, Some(Role::new("doctor")));
    }

    #[test]
    fn unknown_role_id_leaves_principal_unhydrated() {
        let registry = Arc::new(CountingRegistry::default());
        let guard = SessionGuard::new(registry, HydrationPolicy::default());
        let mut session = doctor_session();

        let p = guard.check(&mut session, t0()).unwrap();
        assert_eq!(p.role_name, None);
        assert!(!session.is_modified());
    }

    #[test]
    fn registry_failure_keeps_previous_name() {
        let registry = Arc::new(CountingRegistry {
            fail: true,
            ..Default::default()
        });
        let guard = SessionGuard::new(registry, HydrationPolicy::expire_after(Duration::minutes(1)));
        let principal = Principal::with_role(UserId::new(1), RoleId::new(2), Role::new("nurse"), t0());

        let hydrated = guard.hydrate(&principal, t0() + Duration::hours(1));
        assert_eq!(hydrated, principal);
    }

    #[test]
    fn hydrate_is_pure() {
        let registry = Arc::new(CountingRegistry::with(&[(4, "doctor")]));
        let guard = SessionGuard::new(registry, HydrationPolicy::default());
        let original = Principal::new(UserId::new(3), RoleId::new(4));

        let hydrated = guard.hydrate(&original, t0());
        assert_eq!(original.role_name, None);
        assert_eq!(hydrated.role_name, Some(Role::new("doctor")));
        assert_eq!(hydrated.role_resolved_at, Some(t0()));
    }
}
