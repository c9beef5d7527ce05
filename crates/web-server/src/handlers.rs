use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use core_types::{identity, DoctorDetails, NewIdentity, PatientDetails, RoleDetails};
use database::{DbError, DoctorUpdate, NewAppointment};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// The request body for `POST /api/doctors`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub license_number: String,
    pub qualifications: Option<String>,
    pub experience_years: Option<i32>,
    pub consultation_fee: Option<Decimal>,
    pub clinic_id: Option<i64>,
    pub is_available: Option<bool>,
}

/// The request body for `PUT /api/doctors/:id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub license_number: String,
    pub qualifications: Option<String>,
    pub experience_years: Option<i32>,
    pub consultation_fee: Option<Decimal>,
    pub is_available: Option<bool>,
}

/// The request body for `POST /api/patients`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
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
}

/// The request body for `POST /api/appointments`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub clinic_id: Option<i64>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub symptoms: Option<String>,
    pub fee: Option<Decimal>,
    pub appointment_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// # GET /api/doctors
pub async fn get_doctors(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let doctors = state.repo.get_all_doctors().await?;
    tracing::info!(count = doctors.len(), "Fetched doctors");
    Ok(Json(json!({
        "success": true,
        "count": doctors.len(),
        "data": doctors,
    })))
}

/// # GET /api/doctors/:id
pub async fn get_doctor(
    Path(doctor_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.repo.get_doctor(doctor_id).await.map_err(|e| match e {
        DbError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        other => other.into(),
    })?;
    Ok(Json(json!({ "success": true, "data": doctor })))
}

/// # POST /api/doctors
///
/// Onboards a doctor: one atomic registration creating the identity row and
/// the doctor profile together.
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let new_identity = NewIdentity::from_parts(
        &request.first_name,
        &request.last_name,
        &request.email,
        &request.phone,
    );
    let specialization = request.specialization.clone();
    let details = RoleDetails::Doctor(DoctorDetails {
        clinic_id: request.clinic_id,
        specialization: request.specialization,
        license_number: request.license_number,
        qualifications: request.qualifications,
        experience_years: request.experience_years,
        consultation_fee: request.consultation_fee,
        is_available: request.is_available.unwrap_or(true),
    });

    let registered = state.registrar.register(&new_identity, &details).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor registered successfully",
        "data": {
            "identityId": registered.user_id,
            "fullName": registered.full_name,
            "email": registered.email,
            "phone": registered.phone,
            "specialization": specialization,
        },
    })))
}

/// # PUT /api/doctors/:id
pub async fn update_doctor(
    Path(doctor_id): Path<i64>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let update = DoctorUpdate {
        full_name: identity::display_name(&request.first_name, &request.last_name),
        email: request.email,
        phone: request.phone,
        specialization: request.specialization,
        license_number: request.license_number,
        qualifications: request.qualifications.unwrap_or_default(),
        experience_years: request.experience_years.unwrap_or(0),
        consultation_fee: request.consultation_fee.unwrap_or_default(),
        is_available: request.is_available.unwrap_or(true),
    };

    state
        .repo
        .update_doctor(doctor_id, &update)
        .await
        .map_err(|e| match e {
            DbError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor updated successfully",
        "data": {
            "doctorId": doctor_id,
            "fullName": update.full_name,
            "email": update.email,
            "phone": update.phone,
            "specialization": update.specialization,
        },
    })))
}

/// # DELETE /api/doctors/:id
pub async fn delete_doctor(
    Path(doctor_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    state
        .repo
        .delete_doctor(doctor_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted successfully",
    })))
}

/// # GET /api/patients
pub async fn get_patients(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let patients = state.repo.get_all_patients().await?;
    tracing::info!(count = patients.len(), "Fetched patients");
    Ok(Json(json!({
        "success": true,
        "count": patients.len(),
        "data": patients,
    })))
}

/// # POST /api/patients
///
/// Onboards a patient through the same atomic registration protocol as
/// doctors.
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let mut new_identity = NewIdentity::from_parts(
        &request.first_name,
        &request.last_name,
        &request.email,
        &request.phone,
    );
    new_identity.date_of_birth = request.date_of_birth;
    new_identity.gender = request.gender;
    new_identity.address = request.address;

    let details = RoleDetails::Patient(PatientDetails {
        national_id: request.national_id,
        emergency_contact: request.emergency_contact,
        blood_type: request.blood_type,
        allergies: request.allergies,
        chronic_diseases: request.chronic_diseases,
    });

    let registered = state.registrar.register(&new_identity, &details).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient registered successfully",
        "data": {
            "identityId": registered.user_id,
            "fullName": registered.full_name,
            "email": registered.email,
            "phone": registered.phone,
        },
    })))
}

/// # GET /api/appointments/today
pub async fn get_todays_appointments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let today = Utc::now().date_naive();
    let appointments = state.repo.appointments_on(today).await?;
    Ok(Json(json!({
        "success": true,
        "date": today,
        "count": appointments.len(),
        "data": appointments,
    })))
}

/// # POST /api/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = NewAppointment {
        patient_id: request.patient_id,
        doctor_id: request.doctor_id,
        clinic_id: request.clinic_id,
        appointment_date: request.appointment_date,
        appointment_time: request.appointment_time,
        symptoms: request.symptoms,
        fee: request.fee,
        appointment_type: request.appointment_type,
    };
    let appointment_id = state.repo.create_appointment(&appointment).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked successfully",
        "data": {
            "appointmentId": appointment_id,
            "appointmentDate": appointment.appointment_date,
            "appointmentTime": appointment.appointment_time,
        },
    })))
}

/// # GET /api/dashboard/stats
///
/// Six independent counters gathered concurrently and coalesced into one
/// response.
pub async fn get_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let today = Utc::now().date_naive();
    let stats = state.repo.dashboard_stats(today).await?;
    Ok(Json(json!({
        "success": true,
        "data": stats,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// # GET /api/search/doctors?q=
pub async fn search_doctors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let hits = state.repo.search_doctors(&query.q).await?;
    Ok(Json(json!({
        "success": true,
        "count": hits.len(),
        "data": hits,
    })))
}

/// # GET /api
pub async fn api_index() -> Json<Value> {
    Json(json!({
        "app": "Clinic Management System",
        "version": env!("CARGO_PKG_VERSION"),
        "availableEndpoints": [
            "GET  /api/doctors - list doctors",
            "POST /api/doctors - register a doctor",
            "GET  /api/doctors/:id - doctor details",
            "PUT  /api/doctors/:id - update a doctor",
            "DELETE /api/doctors/:id - delete a doctor",
            "GET  /api/patients - list patients",
            "POST /api/patients - register a patient",
            "GET  /api/appointments/today - today's appointments",
            "POST /api/appointments - book an appointment",
            "GET  /api/dashboard/stats - system counters",
            "GET  /api/search/doctors?q= - search doctors",
        ],
        "status": "running",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_doctor_request_accepts_camel_case_bodies() {
        let body = json!({
            "firstName": "Amal",
            "lastName": "Said",
            "email": "a.said@example.com",
            "phone": "0550000000",
            "specialization": "Cardiology",
            "licenseNumber": "L123",
            "clinicId": 1
        });
        let request: CreateDoctorRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.license_number, "L123");
        assert_eq!(request.clinic_id, Some(1));
        assert!(request.experience_years.is_none());
    }

    #[test]
    fn search_query_defaults_to_empty_term() {
        let query: SearchQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.q, "");
    }
}
