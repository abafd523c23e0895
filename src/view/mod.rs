//! View State: the snapshot the presentation layer renders.

pub mod state;

pub use state::{PatientRecords, Ticket, ViewField, ViewSnapshot, ViewState};
