//! Infrastructure layer: collaborators the authorization engine consumes.
//!
//! Only in-memory stores live here for now; SQL-backed oracles implement the
//! same `clinic-auth` traits.

pub mod stores;

mod integration_tests;

pub use stores::{
    AppointmentRecord, ClinicSeed, InMemoryClinicRecords, InMemoryRoleRegistry, LabOrderRecord,
    PrescriptionRecord,
};
