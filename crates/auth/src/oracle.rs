//! Ownership oracles: "is this doctor assigned to / owner of this resource".
//!
//! These are point lookups backed by whatever store the application uses.
//! The gate only calls them when a role holds an `_assigned` permission *and*
//! the authorization context carries the matching resource id.

use std::sync::Arc;

use thiserror::Error;

use clinic_core::{AppointmentId, LabOrderId, PatientId, PrescriptionId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("ownership lookup unavailable: {0}")]
    Unavailable(String),
}

pub trait PatientAssignments: Send + Sync {
    /// True when the doctor has at least one appointment with the patient.
    fn is_patient_assigned_to_doctor(
        &self,
        patient_id: PatientId,
        doctor_id: UserId,
    ) -> Result<bool, OracleError>;
}

pub trait AppointmentOwnership: Send + Sync {
    fn is_appointment_owned_by_doctor(
        &self,
        appointment_id: AppointmentId,
        doctor_id: UserId,
    ) -> Result<bool, OracleError>;
}

pub trait LabOrderOwnership: Send + Sync {
    /// Ordering doctor of the lab order, `None` if the order does not exist.
    fn find_lab_order_owner(&self, lab_order_id: LabOrderId) -> Result<Option<UserId>, OracleError>;
}

pub trait PrescriptionOwnership: Send + Sync {
    /// Prescribing doctor, `None` if the prescription does not exist.
    fn find_prescription_owner(
        &self,
        prescription_id: PrescriptionId,
    ) -> Result<Option<UserId>, OracleError>;
}

/// The four oracles the gate is constructed with.
#[derive(Clone)]
pub struct OwnershipOracles {
    pub patients: Arc<dyn PatientAssignments>,
    pub appointments: Arc<dyn AppointmentOwnership>,
    pub lab_orders: Arc<dyn LabOrderOwnership>,
    pub prescriptions: Arc<dyn PrescriptionOwnership>,
}

impl OwnershipOracles {
    /// Use one backing store for all four lookups.
    pub fn from_shared<T>(store: Arc<T>) -> Self
    where
        T: PatientAssignments + AppointmentOwnership + LabOrderOwnership + PrescriptionOwnership + 'static,
    {
        Self {
            patients: store.clone(),
            appointments: store.clone(),
            lab_orders: store.clone(),
            prescriptions: store,
        }
    }
}

impl core::fmt::Debug for OwnershipOracles {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OwnershipOracles").finish_non_exhaustive()
    }
}
