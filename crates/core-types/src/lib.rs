pub mod enums;
pub mod error;
pub mod identity;

// Re-export the core types to provide a clean public API.
pub use enums::UserRole;
pub use error::CoreError;
pub use identity::{
    DoctorDetails, NewIdentity, PatientDetails, RegisteredIdentity, RoleDetails,
};
