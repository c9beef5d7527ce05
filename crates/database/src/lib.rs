//! # Clinic Database Crate
//!
//! This crate is the application's only doorway to PostgreSQL. It owns the
//! connection pool, the atomic registration protocol, and every SQL query
//! the rest of the system runs.
//!
//! ## Architectural Principles
//!
//! - **Owned pool, no globals:** the pool is created once via `connect`,
//!   then injected into the `Registrar` and `ClinicRepository`. Nothing in
//!   this crate touches ambient state.
//! - **Leases are RAII:** a connection is held exactly as long as a unit of
//!   work needs it, and every exit path (success, error, caller abandonment)
//!   returns it to the pool exactly once.
//! - **Atomic dual-writes:** creating a doctor or patient writes an identity
//!   row and a role row inside one transaction. Either both become visible
//!   at the commit point or neither does.
//!
//! ## Public API
//!
//! - `connect` / `close`: the pool lifecycle.
//! - `run_migrations`: applies the schema, ensuring it is up-to-date at startup.
//! - `Registrar`: the atomic identity + role-profile registration protocol.
//! - `ClinicRepository`: the high-level data access methods for everything else.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod registrar;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{close, connect, run_migrations};
pub use error::DbError;
pub use registrar::Registrar;
pub use repository::{
    AppointmentSummary, ClinicRepository, DashboardStats, DoctorRecord, DoctorSearchHit,
    DoctorSummary, DoctorUpdate, NewAppointment, PatientSummary,
};
