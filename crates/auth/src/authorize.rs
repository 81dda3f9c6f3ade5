use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use clinic_core::{AppointmentId, LabOrderId, PatientId, PrescriptionId, UserId};

use crate::{
    Ability, Action, AuthzContext, OracleError, OwnershipOracles, Permission, PermissionTable, Principal,
    Resource, Session, SessionGuard,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: '{ability}' ({reason})")]
    Forbidden { ability: String, reason: DenialReason },
}

/// Why an ability was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    AdminRole,
    Wildcard,
    ExactPermission,
    AllScope,
    Assigned,
    AssignedViaPatient,
}

/// Why an ability was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    /// The role holds nothing that covers the ability.
    NoMatchingPermission,
    /// An `_assigned` permission applies but the context lacks the resource id.
    MissingContext { key: &'static str },
    /// The ownership lookup answered "not this doctor".
    NotAssigned,
    /// The ownership lookup failed.
    OracleUnavailable,
}

impl core::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DenialReason::NoMatchingPermission => f.write_str("no matching permission"),
            DenialReason::MissingContext { key } => write!(f, "missing context key '{key}'"),
            DenialReason::NotAssigned => f.write_str("not assigned to resource"),
            DenialReason::OracleUnavailable => f.write_str("ownership lookup unavailable"),
        }
    }
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed(Grant),
    Denied(DenialReason),
    Unauthenticated,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

/// Which entry point is evaluating.
///
/// `Query` (the [`Gate::allows`] form) decides `.write` abilities purely on
/// wildcard/verbatim permissions: it has no `_all` or `_assigned` rules for
/// writes. UI gating code relies on that narrower answer, so the two modes
/// can disagree for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    Enforce,
    Query,
}

/// Authorization engine: role permissions plus per-resource ownership checks.
#[derive(Debug, Clone)]
pub struct Gate {
    table: Arc<PermissionTable>,
    oracles: OwnershipOracles,
    guard: SessionGuard,
}

impl Gate {
    pub fn new(table: Arc<PermissionTable>, oracles: OwnershipOracles, guard: SessionGuard) -> Self {
        Self { table, oracles, guard }
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    /// Session precondition shared by every entry point.
    pub fn check<'s>(&self, session: &'s mut Session) -> Result<&'s Principal, AuthzError> {
        self.guard.check(session, Utc::now())
    }

    /// Enforcing form: `Err` means the request must not proceed.
    pub fn authorize(&self, session: &mut Session, ability: impl Into<Ability>, ctx: &AuthzContext) -> Result<(), AuthzError> {
        let ability = ability.into();
        match self.evaluate(session, &ability, ctx, EvaluationMode::Enforce, Utc::now()) {
            Decision::Allowed(_) => Ok(()),
            Decision::Unauthenticated => Err(AuthzError::Unauthenticated),
            Decision::Denied(reason) => Err(AuthzError::Forbidden {
                ability: ability.as_str().to_string(),
                reason,
            }),
        }
    }

    /// Query form: never fails, safe to call speculatively.
    pub fn allows(&self, session: &mut Session, ability: impl Into<Ability>, ctx: &AuthzContext) -> bool {
        let ability = ability.into();
        self.evaluate(session, &ability, ctx, EvaluationMode::Query, Utc::now())
            .is_allowed()
    }

    /// Run the session guard, then the policy.
    pub fn evaluate(
        &self,
        session: &mut Session,
        ability: &Ability,
        ctx: &AuthzContext,
        mode: EvaluationMode,
        now: DateTime<Utc>,
    ) -> Decision {
        let principal = match self.guard.check(session, now) {
            Ok(p) => p,
            Err(_) => return Decision::Unauthenticated,
        };

        let decision = self.decide(principal, ability, ctx, mode);
        match &decision {
            Decision::Allowed(grant) => tracing::debug!(
                principal_id = %principal.id,
                role = principal.role().map(|r| r.as_str()).unwrap_or("<none>"),
                ability = %ability,
                ?grant,
                "authorization granted"
            ),
            Decision::Denied(reason) => {
                if !ability.is_well_formed() {
                    tracing::warn!(ability = %ability, "denied ability is not of the form <resource>.<verb>");
                }
                tracing::info!(
                    principal_id = %principal.id,
                    role = principal.role().map(|r| r.as_str()).unwrap_or("<none>"),
                    ability = %ability,
                    ?mode,
                    %reason,
                    "authorization denied"
                );
            }
            Decision::Unauthenticated => {}
        }
        decision
    }

    /// The policy over an already-hydrated principal.
    pub fn decide(&self, principal: &Principal, ability: &Ability, ctx: &AuthzContext, mode: EvaluationMode) -> Decision {
        // Checked before the table so admin keeps full access even without a table entry.
        if principal.is_admin() {
            return Decision::Allowed(Grant::AdminRole);
        }

        let perms = principal
            .role()
            .map_or(PermissionTable::no_permissions(), |role| self.table.permissions_for(role.as_str()));

        if perms.contains(Permission::WILDCARD) {
            return Decision::Allowed(Grant::Wildcard);
        }
        if perms.contains(ability.as_str()) {
            return Decision::Allowed(Grant::ExactPermission);
        }

        match ability.granular() {
            Some((_, Action::Write)) if mode == EvaluationMode::Query => {
                Decision::Denied(DenialReason::NoMatchingPermission)
            }
            Some((resource, action)) => self.decide_granular(principal.id, perms, resource, action, ctx),
            None => Decision::Denied(DenialReason::NoMatchingPermission),
        }
    }

    fn decide_granular(
        &self,
        doctor_id: UserId,
        perms: &HashSet<Permission>,
        resource: Resource,
        action: Action,
        ctx: &AuthzContext,
    ) -> Decision {
        if perms.contains(resource.all_permission(action).as_str()) {
            return Decision::Allowed(Grant::AllScope);
        }
        if !perms.contains(resource.assigned_permission(action).as_str()) {
            return Decision::Denied(DenialReason::NoMatchingPermission);
        }

        let key = ownership_key(resource);
        let primary = ctx.id(key).map(|id| self.owns(resource, id, doctor_id));

        match primary {
            Some(Ok(true)) => return Decision::Allowed(Grant::Assigned),
            Some(Err(e)) => {
                tracing::warn!(resource = resource.as_str(), %key, error = %e, "ownership lookup failed");
                return Decision::Denied(DenialReason::OracleUnavailable);
            }
            Some(Ok(false)) | None => {}
        }

        // A prescription can also be read through the patient it was written for.
        if resource == Resource::Prescriptions
            && action == Action::Read
            && let Some(patient_id) = ctx.id(AuthzContext::PATIENT_ID)
        {
            return match self
                .oracles
                .patients
                .is_patient_assigned_to_doctor(PatientId::new(patient_id), doctor_id)
            {
                Ok(true) => Decision::Allowed(Grant::AssignedViaPatient),
                Ok(false) => Decision::Denied(DenialReason::NotAssigned),
                Err(e) => {
                    tracing::warn!(error = %e, "patient assignment lookup failed");
                    Decision::Denied(DenialReason::OracleUnavailable)
                }
            };
        }

        match primary {
            Some(_) => Decision::Denied(DenialReason::NotAssigned),
            None => Decision::Denied(DenialReason::MissingContext { key }),
        }
    }

    fn owns(&self, resource: Resource, id: i64, doctor_id: UserId) -> Result<bool, OracleError> {
        match resource {
            Resource::Patients | Resource::Medical => self
                .oracles
                .patients
                .is_patient_assigned_to_doctor(PatientId::new(id), doctor_id),
            Resource::Appointments => self
                .oracles
                .appointments
                .is_appointment_owned_by_doctor(AppointmentId::new(id), doctor_id),
            Resource::Lab => Ok(self.oracles.lab_orders.find_lab_order_owner(LabOrderId::new(id))? == Some(doctor_id)),
            Resource::Prescriptions => Ok(self
                .oracles
                .prescriptions
                .find_prescription_owner(PrescriptionId::new(id))?
                == Some(doctor_id)),
        }
    }
}

/// Context key carrying the id the ownership check for `resource` needs.
pub fn ownership_key(resource: Resource) -> &'static str {
    match resource {
        Resource::Patients | Resource::Medical => AuthzContext::PATIENT_ID,
        Resource::Appointments => AuthzContext::APPOINTMENT_ID,
        Resource::Lab => AuthzContext::LAB_ORDER_ID,
        Resource::Prescriptions => AuthzContext::PRESCRIPTION_ID,
    }
}
