//! Integration tests for the gate wired to the in-memory stores.
//!
//! Tests: Session → SessionGuard → RoleRegistry → Gate → Ownership oracles
//!
//! Verifies:
//! - First check hydrates the role name from the registry
//! - Doctors are scoped to the patients and orders they own
//! - A role renamed mid-session is picked up only after the TTL

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use clinic_auth::{
        Ability, AuthzContext, AuthzError, Decision, EvaluationMode, Gate, Grant, HydrationPolicy,
        OwnershipOracles, PermissionTable, Principal, Role, Session, SessionGuard,
    };
    use clinic_core::{AppointmentId, LabOrderId, PatientId, PrescriptionId, RoleId, UserId};

    use crate::stores::{
        AppointmentRecord, ClinicSeed, InMemoryClinicRecords, InMemoryRoleRegistry, LabOrderRecord,
        PrescriptionRecord,
    };

    const DOCTOR: UserId = UserId::new(3);
    const OTHER_DOCTOR: UserId = UserId::new(4);

    fn seed() -> ClinicSeed {
        ClinicSeed {
            appointments: vec![AppointmentRecord {
                id: AppointmentId::new(1),
                patient_id: PatientId::new(100),
                doctor_id: DOCTOR,
            }],
            lab_orders: vec![LabOrderRecord {
                id: LabOrderId::new(7),
                patient_id: PatientId::new(100),
                doctor_id: DOCTOR,
            }],
            prescriptions: vec![PrescriptionRecord {
                id: PrescriptionId::new(9),
                patient_id: PatientId::new(100),
                doctor_id: OTHER_DOCTOR,
            }],
        }
    }

    fn setup(policy: HydrationPolicy) -> (Arc<InMemoryRoleRegistry>, Gate) {
        let table = Arc::new(PermissionTable::clinic_default());
        let registry = Arc::new(InMemoryRoleRegistry::from_table(&table));
        let records = Arc::new(InMemoryClinicRecords::from_seed(seed()));
        let gate = Gate::new(
            table,
            OwnershipOracles::from_shared(records),
            SessionGuard::new(registry.clone(), policy),
        );
        (registry, gate)
    }

    fn login(registry: &InMemoryRoleRegistry, user: UserId, role: &str) -> Session {
        let role_id = registry.id_of(role).unwrap().unwrap();
        Session::authenticated(Principal::new(user, role_id))
    }

    #[test]
    fn doctor_flow_through_in_memory_stores() {
        let (registry, gate) = setup(HydrationPolicy::default());
        let mut session = login(&registry, DOCTOR, "doctor");

        let patient = AuthzContext::new().with("patient_id", 100);
        gate.authorize(&mut session, "patients.read", &patient).unwrap();
        gate.authorize(&mut session, "medical.write", &patient).unwrap();
        gate.authorize(&mut session, "lab.write", &AuthzContext::new().with("lab_order_id", 7))
            .unwrap();

        assert!(session.is_modified());
        assert_eq!(session.principal().unwrap().role(), Some(&Role::new("doctor")));

        // Prescription 9 belongs to another doctor but is for an assigned patient.
        let via_patient = AuthzContext::new().with("prescription_id", 9).with("patient_id", 100);
        assert!(gate.allows(&mut session, "prescriptions.read", &via_patient));
        assert!(matches!(
            gate.authorize(&mut session, "prescriptions.write", &via_patient),
            Err(AuthzError::Forbidden { .. })
        ));
    }

    #[test]
    fn other_doctor_is_not_assigned() {
        let (registry, gate) = setup(HydrationPolicy::default());
        let mut session = login(&registry, OTHER_DOCTOR, "doctor");

        let patient = AuthzContext::new().with("patient_id", 100);
        assert!(!gate.allows(&mut session, "patients.read", &patient));
        assert!(gate.authorize(&mut session, "appointments.read", &AuthzContext::new().with("appointment_id", 1)).is_err());
        gate.authorize(&mut session, "prescriptions.write", &AuthzContext::new().with("prescription_id", 9))
            .unwrap();
    }

    #[test]
    fn renamed_role_is_picked_up_after_ttl() {
        let (registry, gate) = setup(HydrationPolicy::expire_after(Duration::minutes(5)));
        let mut session = Session::authenticated(Principal::new(UserId::new(20), RoleId::new(2)));
        let ability = Ability::new("billing.manage");
        let t0 = Utc::now();

        let first = gate.evaluate(&mut session, &ability, &AuthzContext::new(), EvaluationMode::Enforce, t0);
        assert_eq!(first, Decision::Allowed(Grant::ExactPermission));

        registry.insert(RoleId::new(2), Role::new("inventory_manager")).unwrap();

        let cached = gate.evaluate(
            &mut session,
            &ability,
            &AuthzContext::new(),
            EvaluationMode::Enforce,
            t0 + Duration::minutes(1),
        );
        assert!(cached.is_allowed());

        let refreshed = gate.evaluate(
            &mut session,
            &ability,
            &AuthzContext::new(),
            EvaluationMode::Enforce,
            t0 + Duration::minutes(6),
        );
        assert!(!refreshed.is_allowed());
    }
}
