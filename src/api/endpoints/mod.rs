//! API endpoint handlers, one module per resource.
//!
//! Handlers lock the shared connection, call one domain operation and
//! shape the JSON reply. Validation lives in the domain modules.

pub mod admins;
pub mod analytics;
pub mod appointments;
pub mod doctors;
pub mod health;
pub mod medical_records;
pub mod notifications;
pub mod patients;
pub mod reports;
pub mod time_slots;
