//! Doctor endpoints, including schedules.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, MessageData};
use crate::models::{AppointmentView, Doctor, Schedule};
use crate::registration::{self, DoctorInput, WithPassword};
use crate::scheduling::{self, ScheduleInput};
use crate::{appointment, db};

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub doctor_id: String,
    pub data: Doctor,
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Doctor>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| Ok(db::list_doctors(conn)?))?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<WithPassword<DoctorInput>>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    let (input, password_hash) = body.into_parts().await?;
    let doctor = ctx.with_db(|conn| {
        registration::register_doctor(conn, input, password_hash.as_deref())
    })?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

/// `POST /api/doctors/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<WithPassword<DoctorInput>>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (input, password_hash) = body.into_parts().await?;
    let doctor = ctx.with_db(|conn| {
        registration::register_doctor(conn, input, password_hash.as_deref())
    })?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Doctor registered successfully",
            doctor_id: doctor.doctor_id.clone(),
            data: doctor,
        }),
    ))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    Ok(Json(ctx.with_db(|conn| registration::get_doctor(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<WithPassword<DoctorInput>>,
) -> Result<Json<Doctor>, ApiError> {
    let (input, password_hash) = body.into_parts().await?;
    Ok(Json(ctx.with_db(|conn| {
        registration::update_doctor(conn, &id, input, password_hash.as_deref())
    })?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| registration::delete_doctor(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/doctors/:id/schedule`
pub async fn schedule(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| scheduling::doctor_schedules(conn, &id))?))
}

/// `POST /api/doctors/:id/set_schedule`
pub async fn set_schedule(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ScheduleInput>,
) -> Result<(StatusCode, Json<MessageData<Schedule>>), ApiError> {
    let schedule = ctx.with_db(|conn| scheduling::set_schedule(conn, &id, input))?;
    Ok((
        StatusCode::CREATED,
        Json(MessageData {
            message: "Schedule created successfully",
            data: schedule,
        }),
    ))
}

/// `GET /api/doctors/:id/appointments`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| appointment::doctor_appointments(conn, &id))?))
}
