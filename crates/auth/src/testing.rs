//! In-crate fakes for gate tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use clinic_core::{AppointmentId, LabOrderId, PatientId, PrescriptionId, RoleId, UserId};

use crate::{
    AppointmentOwnership, Gate, HydrationPolicy, LabOrderOwnership, OracleError, OwnershipOracles,
    PatientAssignments, PermissionTable, PrescriptionOwnership, Principal, RegistryError, Role,
    RoleRecord, RoleRegistry, Session, SessionGuard,
};

#[derive(Default)]
pub(crate) struct FakeClinic {
    roles: Mutex<HashMap<RoleId, Role>>,
    assignments: Mutex<HashSet<(PatientId, UserId)>>,
    appointments: Mutex<HashMap<AppointmentId, UserId>>,
    lab_orders: Mutex<HashMap<LabOrderId, UserId>>,
    prescriptions: Mutex<HashMap<PrescriptionId, UserId>>,
    oracle_calls: AtomicUsize,
    registry_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeClinic {
    pub(crate) fn add_role(&self, id: i64, name: &'static str) {
        self.roles.lock().unwrap().insert(RoleId::new(id), Role::new(name));
    }

    pub(crate) fn assign_patient(&self, patient: PatientId, doctor: UserId) {
        self.assignments.lock().unwrap().insert((patient, doctor));
    }

    pub(crate) fn add_appointment(&self, id: AppointmentId, doctor: UserId) {
        self.appointments.lock().unwrap().insert(id, doctor);
    }

    pub(crate) fn add_lab_order(&self, id: LabOrderId, doctor: UserId) {
        self.lab_orders.lock().unwrap().insert(id, doctor);
    }

    pub(crate) fn add_prescription(&self, id: PrescriptionId, doctor: UserId) {
        self.prescriptions.lock().unwrap().insert(id, doctor);
    }

    pub(crate) fn go_down(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    pub(crate) fn oracle_calls(&self) -> usize {
        self.oracle_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn registry_calls(&self) -> usize {
        self.registry_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self) -> Result<(), OracleError> {
        self.oracle_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OracleError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl PatientAssignments for FakeClinic {
    fn is_patient_assigned_to_doctor(&self, patient_id: PatientId, doctor_id: UserId) -> Result<bool, OracleError> {
        self.lookup()?;
        Ok(self.assignments.lock().unwrap().contains(&(patient_id, doctor_id)))
    }
}

impl AppointmentOwnership for FakeClinic {
    fn is_appointment_owned_by_doctor(&self, appointment_id: AppointmentId, doctor_id: UserId) -> Result<bool, OracleError> {
        self.lookup()?;
        Ok(self.appointments.lock().unwrap().get(&appointment_id) == Some(&doctor_id))
    }
}

impl LabOrderOwnership for FakeClinic {
    fn find_lab_order_owner(&self, lab_order_id: LabOrderId) -> Result<Option<UserId>, OracleError> {
        self.lookup()?;
        Ok(self.lab_orders.lock().unwrap().get(&lab_order_id).copied())
    }
}

impl PrescriptionOwnership for FakeClinic {
    fn find_prescription_owner(&self, prescription_id: PrescriptionId) -> Result<Option<UserId>, OracleError> {
        self.lookup()?;
        Ok(self.prescriptions.lock().unwrap().get(&prescription_id).copied())
    }
}

impl RoleRegistry for FakeClinic {
    fn find_by_id(&self, role_id: RoleId) -> Result<Option<RoleRecord>, RegistryError> {
        self.registry_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.roles.lock().unwrap().get(&role_id).map(|name| RoleRecord {
            id: role_id,
            name: name.clone(),
        }))
    }
}

pub(crate) fn gate_with(clinic: Arc<FakeClinic>) -> Gate {
    Gate::new(
        Arc::new(PermissionTable::clinic_default()),
        OwnershipOracles::from_shared(clinic.clone()),
        SessionGuard::new(clinic, HydrationPolicy::default()),
    )
}

/// A session whose role name was resolved just now.
pub(crate) fn session_for(user_id: i64, role: &'static str) -> Session {
    Session::authenticated(Principal::with_role(
        UserId::new(user_id),
        RoleId::new(0),
        Role::new(role),
        Utc::now(),
    ))
}
