//! `clinic-auth` — authorization engine for the clinic application.
//!
//! A role → permission table combined with per-resource ownership checks
//! ("a doctor may act on patients they have seen"). Decoupled from HTTP and
//! storage: collaborators come in as traits, decisions go out as values.

pub mod authorize;
pub mod context;
pub mod explain;
pub mod oracle;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod session;

#[cfg(test)]
mod testing;

pub use authorize::{AuthzError, Decision, DenialReason, EvaluationMode, Gate, Grant};
pub use context::AuthzContext;
pub use explain::{AuthorizationExplanation, RbacRegistry};
pub use oracle::{
    AppointmentOwnership, LabOrderOwnership, OracleError, OwnershipOracles, PatientAssignments,
    PrescriptionOwnership,
};
pub use permissions::{Ability, Action, Permission, Resource};
pub use policy::PermissionTable;
pub use principal::{Principal, Session};
pub use roles::{Role, RoleRecord};
pub use session::{HydrationPolicy, RegistryError, RoleRegistry, SessionGuard};
