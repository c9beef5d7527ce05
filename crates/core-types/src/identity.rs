use crate::enums::UserRole;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The shared person attributes behind every role. One `users` row.
///
/// The credential hash is not part of this struct: new identities always
/// start with the default credential, which the registrar hashes itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

impl NewIdentity {
    /// Builds the identity record from the name/contact fields a
    /// registration form submits. The username is derived from the email
    /// and the display name from the two name parts.
    pub fn from_parts(first_name: &str, last_name: &str, email: &str, phone: &str) -> Self {
        Self {
            username: username_from_email(email),
            email: email.to_string(),
            phone: phone.to_string(),
            full_name: display_name(first_name, last_name),
            date_of_birth: None,
            gender: None,
            address: None,
        }
    }
}

/// Doctor-specific attributes. One `doctors` row, owned by its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDetails {
    pub clinic_id: Option<i64>,
    pub specialization: String,
    pub license_number: String,
    pub qualifications: Option<String>,
    pub experience_years: Option<i32>,
    pub consultation_fee: Option<Decimal>,
    pub is_available: bool,
}

/// Patient-specific attributes. One `patients` row, owned by its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetails {
    pub national_id: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
}

/// The role-specific half of a registration. Carries its own role tag so a
/// caller cannot pair doctor fields with a patient tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoleDetails {
    Doctor(DoctorDetails),
    Patient(PatientDetails),
}

impl RoleDetails {
    pub fn role(&self) -> UserRole {
        match self {
            RoleDetails::Doctor(_) => UserRole::Doctor,
            RoleDetails::Patient(_) => UserRole::Patient,
        }
    }
}

/// The durable outcome of a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredIdentity {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
}

/// "{first} {last}", with stray whitespace trimmed from both parts.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string()
}

/// The local part of the email address, falling back to the whole address
/// when the local part is empty.
pub fn username_from_email(email: &str) -> String {
    match email.split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_and_trims() {
        assert_eq!(display_name("Amal", "Said"), "Amal Said");
        assert_eq!(display_name(" Amal ", " Said "), "Amal Said");
        assert_eq!(display_name("Amal", ""), "Amal");
    }

    #[test]
    fn username_is_the_email_local_part() {
        assert_eq!(username_from_email("a.said@example.com"), "a.said");
        assert_eq!(username_from_email("@example.com"), "@example.com");
    }

    #[test]
    fn from_parts_derives_username_and_name() {
        let identity = NewIdentity::from_parts("Amal", "Said", "a.said@example.com", "0550000000");
        assert_eq!(identity.username, "a.said");
        assert_eq!(identity.full_name, "Amal Said");
        assert!(identity.date_of_birth.is_none());
    }

    #[test]
    fn role_details_carry_their_tag() {
        let details = RoleDetails::Patient(PatientDetails {
            national_id: None,
            emergency_contact: None,
            blood_type: Some("O+".to_string()),
            allergies: None,
            chronic_diseases: None,
        });
        assert_eq!(details.role(), UserRole::Patient);
    }
}
