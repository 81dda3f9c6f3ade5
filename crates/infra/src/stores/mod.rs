//! In-memory implementations of the authorization collaborators.

pub mod clinic_records;
pub mod role_registry;

pub use clinic_records::{AppointmentRecord, ClinicSeed, InMemoryClinicRecords, LabOrderRecord, PrescriptionRecord};
pub use role_registry::InMemoryRoleRegistry;
