use crate::error::DbError;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

/// The `ClinicRepository` provides a high-level, application-specific
/// interface to the database. It encapsulates all SQL queries and data
/// access logic outside the registration protocol.
#[derive(Debug, Clone)]
pub struct ClinicRepository {
    pool: PgPool,
}

/// A doctor row joined with its identity and clinic, as the list and search
/// endpoints present it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub doctor_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub license_number: String,
    pub experience_years: i32,
    pub consultation_fee: Decimal,
    pub is_available: bool,
    pub qualifications: String,
    pub available_from: Option<NaiveTime>,
    pub available_to: Option<NaiveTime>,
    pub clinic_name: String,
    pub clinic_id: i64,
}

/// The full doctor detail view, including the identity attributes the list
/// view omits.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRecord {
    pub doctor_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub specialization: String,
    pub license_number: String,
    pub experience_years: i32,
    pub consultation_fee: Decimal,
    pub qualifications: String,
    pub available_from: Option<NaiveTime>,
    pub available_to: Option<NaiveTime>,
    pub max_patients_per_day: Option<i32>,
    pub is_available: bool,
    pub clinic_name: String,
    pub clinic_id: i64,
}

/// The reduced projection returned by the doctor search endpoint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSearchHit {
    pub doctor_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub license_number: String,
    pub is_available: bool,
    pub clinic_name: String,
}

/// The fields a doctor update may change. The role tag is deliberately not
/// among them.
#[derive(Debug, Clone)]
pub struct DoctorUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub license_number: String,
    pub qualifications: String,
    pub experience_years: i32,
    pub consultation_fee: Decimal,
    pub is_available: bool,
}

/// A patient row joined with its identity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub patient_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

/// An appointment joined with the names the schedule view displays.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSummary {
    pub appointment_id: i64,
    pub patient_name: String,
    pub doctor_name: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: String,
    pub symptoms: Option<String>,
    pub fee: Decimal,
    pub appointment_type: String,
    pub clinic_name: String,
}

/// The fields needed to book an appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub clinic_id: Option<i64>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub symptoms: Option<String>,
    pub fee: Option<Decimal>,
    pub appointment_type: Option<String>,
}

/// The coalesced result of the dashboard's independent COUNT queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_doctors: i64,
    pub total_patients: i64,
    pub total_appointments: i64,
    pub today_appointments: i64,
    pub active_clinics: i64,
    pub pending_payments: i64,
}

impl ClinicRepository {
    /// Creates a new `ClinicRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches all doctors with their identity and clinic, ordered by name.
    pub async fn get_all_doctors(&self) -> Result<Vec<DoctorSummary>, DbError> {
        let doctors = sqlx::query_as::<_, DoctorSummary>(
            r#"
            SELECT
                d.doctor_id, u.full_name, u.email, u.phone,
                d.specialization, d.license_number, d.experience_years,
                d.consultation_fee, d.is_available, d.qualifications,
                d.available_from, d.available_to,
                c.clinic_name, c.clinic_id
            FROM doctors d
            JOIN users u ON d.user_id = u.user_id
            JOIN clinics c ON d.clinic_id = c.clinic_id
            ORDER BY u.full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(doctors)
    }

    /// Fetches the full record for a single doctor.
    pub async fn get_doctor(&self, doctor_id: i64) -> Result<DoctorRecord, DbError> {
        let doctor = sqlx::query_as::<_, DoctorRecord>(
            r#"
            SELECT
                d.doctor_id, u.full_name, u.email, u.phone,
                u.date_of_birth, u.gender, u.address,
                d.specialization, d.license_number, d.experience_years,
                d.consultation_fee, d.qualifications,
                d.available_from, d.available_to, d.max_patients_per_day,
                d.is_available, c.clinic_name, c.clinic_id
            FROM doctors d
            JOIN users u ON d.user_id = u.user_id
            JOIN clinics c ON d.clinic_id = c.clinic_id
            WHERE d.doctor_id = $1
            "#,
        )
        .bind(doctor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(doctor)
    }

    /// Updates a doctor's identity row and profile row together.
    ///
    /// Both UPDATEs run in one transaction so a reader never observes a
    /// renamed identity attached to a stale profile.
    pub async fn update_doctor(&self, doctor_id: i64, update: &DoctorUpdate) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Connection)?;

        let user_id: i64 =
            sqlx::query_scalar("SELECT user_id FROM doctors WHERE doctor_id = $1")
                .bind(doctor_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(DbError::NotFound)?;

        sqlx::query(
            r#"
            UPDATE users
            SET full_name = $1, email = $2, phone = $3, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $4
            "#,
        )
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE doctors
            SET specialization = $1, license_number = $2, qualifications = $3,
                experience_years = $4, consultation_fee = $5, is_available = $6,
                updated_at = CURRENT_TIMESTAMP
            WHERE doctor_id = $7
            "#,
        )
        .bind(&update.specialization)
        .bind(&update.license_number)
        .bind(&update.qualifications)
        .bind(update.experience_years)
        .bind(update.consultation_fee)
        .bind(update.is_available)
        .bind(doctor_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(doctor_id, full_name = %update.full_name, "Updated doctor");
        Ok(())
    }

    /// Deletes a doctor and, with it, the identity it owns.
    ///
    /// Lifecycle deletion runs from the profile side: the profile row goes
    /// first, then its identity, inside one transaction.
    pub async fn delete_doctor(&self, doctor_id: i64) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Connection)?;

        let user_id: i64 =
            sqlx::query_scalar("SELECT user_id FROM doctors WHERE doctor_id = $1")
                .bind(doctor_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(DbError::NotFound)?;

        sqlx::query("DELETE FROM doctors WHERE doctor_id = $1")
            .bind(doctor_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(doctor_id, "Deleted doctor and its identity");
        Ok(())
    }

    /// Fetches all patients with their identity, capped at 100 rows.
    pub async fn get_all_patients(&self) -> Result<Vec<PatientSummary>, DbError> {
        let patients = sqlx::query_as::<_, PatientSummary>(
            r#"
            SELECT
                p.patient_id, u.full_name, u.email, u.phone,
                u.date_of_birth, u.gender, u.address,
                p.national_id, p.emergency_contact, p.blood_type,
                p.allergies, p.chronic_diseases,
                p.insurance_provider, p.insurance_number,
                p.created_at::date AS registration_date
            FROM patients p
            JOIN users u ON p.user_id = u.user_id
            ORDER BY u.full_name
            LIMIT 100
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(patients)
    }

    /// Fetches all appointments scheduled on the given date, in time order.
    pub async fn appointments_on(&self, date: NaiveDate) -> Result<Vec<AppointmentSummary>, DbError> {
        let appointments = sqlx::query_as::<_, AppointmentSummary>(
            r#"
            SELECT
                a.appointment_id,
                pu.full_name AS patient_name,
                du.full_name AS doctor_name,
                a.appointment_date, a.appointment_time,
                a.status, a.symptoms, a.fee, a.appointment_type,
                c.clinic_name
            FROM appointments a
            JOIN patients p ON a.patient_id = p.patient_id
            JOIN users pu ON p.user_id = pu.user_id
            JOIN doctors d ON a.doctor_id = d.doctor_id
            JOIN users du ON d.user_id = du.user_id
            JOIN clinics c ON a.clinic_id = c.clinic_id
            WHERE a.appointment_date = $1
            ORDER BY a.appointment_time
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    /// Books a new appointment and returns its generated id.
    pub async fn create_appointment(&self, appointment: &NewAppointment) -> Result<i64, DbError> {
        let appointment_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO appointments
                (patient_id, doctor_id, clinic_id, appointment_date, appointment_time,
                 symptoms, fee, appointment_type, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'scheduled', CURRENT_TIMESTAMP)
            RETURNING appointment_id
            "#,
        )
        .bind(appointment.patient_id)
        .bind(appointment.doctor_id)
        .bind(appointment.clinic_id.unwrap_or(1))
        .bind(appointment.appointment_date)
        .bind(appointment.appointment_time)
        .bind(appointment.symptoms.as_deref().unwrap_or(""))
        .bind(appointment.fee.unwrap_or_default())
        .bind(appointment.appointment_type.as_deref().unwrap_or("consultation"))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(appointment_id, "Booked appointment");
        Ok(appointment_id)
    }

    /// Case-insensitive substring search over doctor name, specialization
    /// and clinic name, capped at 20 hits.
    pub async fn search_doctors(&self, term: &str) -> Result<Vec<DoctorSearchHit>, DbError> {
        let pattern = format!("%{term}%");
        let hits = sqlx::query_as::<_, DoctorSearchHit>(
            r#"
            SELECT
                d.doctor_id, u.full_name, u.email, u.phone,
                d.specialization, d.license_number, d.is_available,
                c.clinic_name
            FROM doctors d
            JOIN users u ON d.user_id = u.user_id
            JOIN clinics c ON d.clinic_id = c.clinic_id
            WHERE u.full_name ILIKE $1
               OR d.specialization ILIKE $1
               OR c.clinic_name ILIKE $1
            LIMIT 20
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(hits)
    }

    /// Gathers the dashboard counters.
    ///
    /// The six COUNTs are independent, so they fan out concurrently over the
    /// pool and join into one struct; the first failure aborts the batch.
    pub async fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats, DbError> {
        let (
            total_doctors,
            total_patients,
            total_appointments,
            today_appointments,
            active_clinics,
            pending_payments,
        ) = tokio::try_join!(
            self.count("SELECT COUNT(*) FROM doctors"),
            self.count("SELECT COUNT(*) FROM patients"),
            self.count("SELECT COUNT(*) FROM appointments"),
            self.count_on_date("SELECT COUNT(*) FROM appointments WHERE appointment_date = $1", today),
            self.count("SELECT COUNT(*) FROM clinics WHERE is_active"),
            self.count("SELECT COUNT(*) FROM invoices WHERE status = 'pending'"),
        )?;

        Ok(DashboardStats {
            total_doctors,
            total_patients,
            total_appointments,
            today_appointments,
            active_clinics,
            pending_payments,
        })
    }

    /// Row counts for every table the system owns, for the `db-check`
    /// connectivity report.
    pub async fn table_counts(&self) -> Result<Vec<(String, i64)>, DbError> {
        // Identifiers cannot be bound as parameters; the list is fixed here.
        const TABLES: [&str; 6] = [
            "users", "doctors", "patients", "appointments", "clinics", "invoices",
        ];

        let mut counts = Vec::with_capacity(TABLES.len());
        for table in TABLES {
            let count = self.count(&format!("SELECT COUNT(*) FROM {table}")).await?;
            counts.push((table.to_string(), count));
        }
        Ok(counts)
    }

    async fn count(&self, sql: &str) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn count_on_date(&self, sql: &str, date: NaiveDate) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
