use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use clinic_auth::{
    AppointmentOwnership, LabOrderOwnership, OracleError, PatientAssignments, PrescriptionOwnership,
};
use clinic_core::{AppointmentId, LabOrderId, PatientId, PrescriptionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabOrderRecord {
    pub id: LabOrderId,
    pub patient_id: PatientId,
    pub doctor_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub id: PrescriptionId,
    pub patient_id: PatientId,
    pub doctor_id: UserId,
}

/// Initial contents for [`InMemoryClinicRecords`] (dev fixtures).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicSeed {
    #[serde(default)]
    pub appointments: Vec<AppointmentRecord>,
    #[serde(default)]
    pub lab_orders: Vec<LabOrderRecord>,
    #[serde(default)]
    pub prescriptions: Vec<PrescriptionRecord>,
}

#[derive(Debug, Default)]
struct Tables {
    appointments: HashMap<AppointmentId, AppointmentRecord>,
    lab_orders: HashMap<LabOrderId, LabOrderRecord>,
    prescriptions: HashMap<PrescriptionId, PrescriptionRecord>,
}

/// In-memory clinic records answering the ownership lookups.
///
/// A doctor is assigned to a patient when any appointment links the two.
#[derive(Debug, Default)]
pub struct InMemoryClinicRecords {
    tables: RwLock<Tables>,
}

impl InMemoryClinicRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: ClinicSeed) -> Self {
        tracing::debug!(
            appointments = seed.appointments.len(),
            lab_orders = seed.lab_orders.len(),
            prescriptions = seed.prescriptions.len(),
            "seeding clinic records"
        );
        let tables = Tables {
            appointments: seed.appointments.into_iter().map(|a| (a.id, a)).collect(),
            lab_orders: seed.lab_orders.into_iter().map(|l| (l.id, l)).collect(),
            prescriptions: seed.prescriptions.into_iter().map(|p| (p.id, p)).collect(),
        };
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub fn record_appointment(&self, record: AppointmentRecord) -> Result<(), OracleError> {
        self.write()?.appointments.insert(record.id, record);
        Ok(())
    }

    pub fn record_lab_order(&self, record: LabOrderRecord) -> Result<(), OracleError> {
        self.write()?.lab_orders.insert(record.id, record);
        Ok(())
    }

    pub fn record_prescription(&self, record: PrescriptionRecord) -> Result<(), OracleError> {
        self.write()?.prescriptions.insert(record.id, record);
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, OracleError> {
        self.tables
            .read()
            .map_err(|_| OracleError::Unavailable("clinic records lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, OracleError> {
        self.tables
            .write()
            .map_err(|_| OracleError::Unavailable("clinic records lock poisoned".to_string()))
    }
}

impl PatientAssignments for InMemoryClinicRecords {
    fn is_patient_assigned_to_doctor(&self, patient_id: PatientId, doctor_id: UserId) -> Result<bool, OracleError> {
        Ok(self
            .read()?
            .appointments
            .values()
            .any(|a| a.patient_id == patient_id && a.doctor_id == doctor_id))
    }
}

impl AppointmentOwnership for InMemoryClinicRecords {
    fn is_appointment_owned_by_doctor(
        &self,
        appointment_id: AppointmentId,
        doctor_id: UserId,
    ) -> Result<bool, OracleError> {
        Ok(self
            .read()?
            .appointments
            .get(&appointment_id)
            .is_some_and(|a| a.doctor_id == doctor_id))
    }
}

impl LabOrderOwnership for InMemoryClinicRecords {
    fn find_lab_order_owner(&self, lab_order_id: LabOrderId) -> Result<Option<UserId>, OracleError> {
        Ok(self.read()?.lab_orders.get(&lab_order_id).map(|l| l.doctor_id))
    }
}

impl PrescriptionOwnership for InMemoryClinicRecords {
    fn find_prescription_owner(&self, prescription_id: PrescriptionId) -> Result<Option<UserId>, OracleError> {
        Ok(self.read()?.prescriptions.get(&prescription_id).map(|p| p.doctor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemoryClinicRecords {
        let seed: ClinicSeed = serde_json::from_value(serde_json::json!({
            "appointments": [
                {"id": 1, "patient_id": 100, "doctor_id": 3},
                {"id": 2, "patient_id": 101, "doctor_id": 4}
            ],
            "lab_orders": [{"id": 7, "patient_id": 100, "doctor_id": 3}],
            "prescriptions": [{"id": 9, "patient_id": 101, "doctor_id": 4}]
        }))
        .unwrap();
        InMemoryClinicRecords::from_seed(seed)
    }

    #[test]
    fn assignment_follows_any_appointment() {
        let records = seeded();
        assert!(records.is_patient_assigned_to_doctor(PatientId::new(100), UserId::new(3)).unwrap());
        assert!(!records.is_patient_assigned_to_doctor(PatientId::new(100), UserId::new(4)).unwrap());

        records
            .record_appointment(AppointmentRecord {
                id: AppointmentId::new(3),
                patient_id: PatientId::new(100),
                doctor_id: UserId::new(4),
            })
            .unwrap();
        assert!(records.is_patient_assigned_to_doctor(PatientId::new(100), UserId::new(4)).unwrap());
    }

    #[test]
    fn appointment_ownership() {
        let records = seeded();
        assert!(records.is_appointment_owned_by_doctor(AppointmentId::new(2), UserId::new(4)).unwrap());
        assert!(!records.is_appointment_owned_by_doctor(AppointmentId::new(2), UserId::new(3)).unwrap());
        assert!(!records.is_appointment_owned_by_doctor(AppointmentId::new(50), UserId::new(3)).unwrap());
    }

    #[test]
    fn owner_lookups() {
        let records = seeded();
        assert_eq!(records.find_lab_order_owner(LabOrderId::new(7)).unwrap(), Some(UserId::new(3)));
        assert_eq!(records.find_lab_order_owner(LabOrderId::new(8)).unwrap(), None);
        assert_eq!(
            records.find_prescription_owner(PrescriptionId::new(9)).unwrap(),
            Some(UserId::new(4))
        );
    }
}
