use std::sync::Arc;

use clinic_auth::{Gate, OwnershipOracles, PermissionTable, SessionGuard};
use clinic_infra::{ClinicSeed, InMemoryClinicRecords, InMemoryRoleRegistry};

use crate::config::ApiConfig;
use crate::session_store::{InMemorySessionStore, SessionStore};

/// Everything request handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub gate: Gate,
    pub sessions: Arc<dyn SessionStore>,
    pub roles: Arc<InMemoryRoleRegistry>,
    pub records: Arc<InMemoryClinicRecords>,
    pub config: ApiConfig,
}

/// Wire the in-memory collaborators around the compiled-in permission table.
pub fn build_services(config: ApiConfig, seed: ClinicSeed) -> AppServices {
    let table = Arc::new(PermissionTable::clinic_default());
    let roles = Arc::new(InMemoryRoleRegistry::from_table(&table));
    let records = Arc::new(InMemoryClinicRecords::from_seed(seed));

    let gate = Gate::new(
        table,
        OwnershipOracles::from_shared(records.clone()),
        SessionGuard::new(roles.clone(), config.hydration),
    );

    tracing::info!(
        role_ttl = ?config.hydration.role_name_ttl,
        login_path = %config.login_path,
        "authorization services ready"
    );

    AppServices {
        gate,
        sessions: InMemorySessionStore::arc(),
        roles,
        records,
        config,
    }
}
