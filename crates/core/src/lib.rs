//! `clinic-core` — identifiers shared by the clinic crates.
//!
//! Nothing in here touches storage or transport.

pub mod id;

pub use id::{AppointmentId, IdError, LabOrderId, PatientId, PrescriptionId, RoleId, UserId};
