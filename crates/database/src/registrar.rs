use crate::error::{duplicate_identity, DbError};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use core_types::{NewIdentity, RegisteredIdentity, RoleDetails};
use sqlx::PgPool;

/// Every new account starts with this credential; it is hashed per
/// registration so no two identities share a digest.
const DEFAULT_CREDENTIAL: &str = "123456";

/// The dual-write registration protocol.
///
/// Onboarding a doctor or a patient creates two rows: the shared identity
/// (`users`) and the role profile (`doctors` / `patients`) referencing it.
/// `register` executes both inserts as one transaction on one leased
/// connection, so an external observer sees the pair appear at a single
/// commit point or not at all.
#[derive(Debug, Clone)]
pub struct Registrar {
    pool: PgPool,
}

impl Registrar {
    /// Creates a new `Registrar` over a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically creates an identity plus its paired role profile.
    ///
    /// Failure taxonomy:
    /// - `DbError::Connection` — no lease could be obtained; nothing was written.
    /// - `DbError::DuplicateIdentity` — the identity insert violated a
    ///   uniqueness constraint; rolled back.
    /// - `DbError::Registration` — any other failure up to and including the
    ///   commit; rolled back.
    ///
    /// The transaction is dropped (and therefore rolled back) on every early
    /// return, including caller abandonment, before the lease goes back to
    /// the pool. The identity insert runs first: the role insert needs its
    /// generated key.
    pub async fn register(
        &self,
        identity: &NewIdentity,
        details: &RoleDetails,
    ) -> Result<RegisteredIdentity, DbError> {
        let role = details.role();
        let password_hash = hash_default_credential()?;

        // Acquiring the lease and opening the transaction are one step.
        let mut tx = self.pool.begin().await.map_err(DbError::Connection)?;

        let user_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users
                (username, password_hash, email, phone, user_type, full_name,
                 date_of_birth, gender, address, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            RETURNING user_id
            "#,
        )
        .bind(&identity.username)
        .bind(&password_hash)
        .bind(&identity.email)
        .bind(&identity.phone)
        .bind(role.as_str())
        .bind(&identity.full_name)
        .bind(identity.date_of_birth)
        .bind(&identity.gender)
        .bind(&identity.address)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify_insert_error("users", e))?;

        match details {
            RoleDetails::Doctor(doctor) => {
                sqlx::query(
                    r#"
                    INSERT INTO doctors
                        (user_id, clinic_id, specialization, license_number,
                         qualifications, experience_years, consultation_fee, is_available)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(user_id)
                .bind(doctor.clinic_id.unwrap_or(1))
                .bind(&doctor.specialization)
                .bind(&doctor.license_number)
                .bind(doctor.qualifications.as_deref().unwrap_or(""))
                .bind(doctor.experience_years.unwrap_or(0))
                .bind(doctor.consultation_fee.unwrap_or_default())
                .bind(doctor.is_available)
                .execute(&mut *tx)
                .await
                .map_err(|e| role_insert_error("doctors", e))?;
            }
            RoleDetails::Patient(patient) => {
                sqlx::query(
                    r#"
                    INSERT INTO patients
                        (user_id, national_id, emergency_contact, blood_type,
                         allergies, chronic_diseases)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(user_id)
                .bind(&patient.national_id)
                .bind(&patient.emergency_contact)
                .bind(&patient.blood_type)
                .bind(&patient.allergies)
                .bind(&patient.chronic_diseases)
                .execute(&mut *tx)
                .await
                .map_err(|e| role_insert_error("patients", e))?;
            }
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Registration commit failed; both rows absent");
            DbError::Registration(e.to_string())
        })?;

        tracing::info!(user_id, full_name = %identity.full_name, role = %role, "Registered new identity");

        Ok(RegisteredIdentity {
            user_id,
            full_name: identity.full_name.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
            role,
        })
    }
}

/// Classifies a failed identity insert. Uniqueness violations become
/// `DuplicateIdentity`; the SQL context stays in the operator log and the
/// returned error carries none of it.
fn classify_insert_error(table: &str, e: sqlx::Error) -> DbError {
    tracing::error!(table, error = %e, "Registration insert failed; rolling back");
    match duplicate_identity(&e) {
        Some(duplicate) => duplicate,
        None => DbError::Registration(e.to_string()),
    }
}

/// A failed role-profile insert always rolls back the whole pair, whatever
/// the underlying cause.
fn role_insert_error(table: &str, e: sqlx::Error) -> DbError {
    tracing::error!(table, error = %e, "Registration insert failed; rolling back");
    DbError::Registration(e.to_string())
}

/// Hashes the default credential with a fresh salt (Argon2id).
fn hash_default_credential() -> Result<String, DbError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(DEFAULT_CREDENTIAL.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Registration(format!("credential hashing failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::PasswordHash;
    use argon2::PasswordVerifier;

    #[test]
    fn default_credential_hash_is_salted_argon2() {
        let first = hash_default_credential().unwrap();
        let second = hash_default_credential().unwrap();
        assert_ne!(first, second);

        let parsed = PasswordHash::new(&first).unwrap();
        assert!(Argon2::default()
            .verify_password(DEFAULT_CREDENTIAL.as_bytes(), &parsed)
            .is_ok());
    }
}
