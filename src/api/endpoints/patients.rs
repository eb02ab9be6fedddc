//! Patient endpoints.
//!
//! - `GET|POST /api/patients`, `GET|PUT|PATCH|DELETE /api/patients/:id`
//! - `POST /api/patients/register`
//! - `GET /api/patients/:id/appointments`, `GET /api/patients/:id/medical_records`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::models::{AppointmentView, MedicalRecordView, Patient};
use crate::registration::{self, PatientInput, WithPassword};
use crate::{appointment, db, records};

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub patient_id: String,
    pub data: Patient,
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| Ok(db::list_patients(conn)?))?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<WithPassword<PatientInput>>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let (input, password_hash) = body.into_parts().await?;
    let patient = ctx.with_db(|conn| {
        registration::register_patient(conn, input, password_hash.as_deref())
    })?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `POST /api/patients/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<WithPassword<PatientInput>>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (input, password_hash) = body.into_parts().await?;
    let patient = ctx.with_db(|conn| {
        registration::register_patient(conn, input, password_hash.as_deref())
    })?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Patient registered successfully",
            patient_id: patient.patient_id.clone(),
            data: patient,
        }),
    ))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(ctx.with_db(|conn| registration::get_patient(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<WithPassword<PatientInput>>,
) -> Result<Json<Patient>, ApiError> {
    let (input, password_hash) = body.into_parts().await?;
    Ok(Json(ctx.with_db(|conn| {
        registration::update_patient(conn, &id, input, password_hash.as_deref())
    })?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| registration::delete_patient(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/patients/:id/appointments`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| appointment::patient_appointments(conn, &id))?))
}

/// `GET /api/patients/:id/medical_records`
pub async fn medical_records(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MedicalRecordView>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| records::patient_records(conn, &id))?))
}
