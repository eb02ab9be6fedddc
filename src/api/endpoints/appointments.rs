//! Appointment endpoints.
//!
//! Creating an appointment books its slot. Lifecycle actions
//! (`confirm`, `cancel`, `complete`) answer with `{message, status}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, MessageData, StatusMessage};
use crate::appointment::{self, AppointmentInput, RescheduleInput};
use crate::models::enums::AppointmentStatus;
use crate::models::AppointmentView;

type StatusReply = Json<StatusMessage<AppointmentStatus>>;

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    Ok(Json(ctx.with_db(appointment::list_appointments)?))
}

/// `POST /api/appointments`: book an appointment.
pub async fn book(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<AppointmentInput>,
) -> Result<(StatusCode, Json<MessageData<AppointmentView>>), ApiError> {
    let view = ctx.with_db(|conn| appointment::book_appointment(conn, input))?;
    Ok((
        StatusCode::CREATED,
        Json(MessageData {
            message: "Appointment booked successfully",
            data: view,
        }),
    ))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentView>, ApiError> {
    Ok(Json(ctx.with_db(|conn| appointment::get_appointment(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AppointmentInput>,
) -> Result<Json<AppointmentView>, ApiError> {
    Ok(Json(ctx.with_db(|conn| appointment::update_appointment(conn, &id, input))?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| appointment::delete_appointment(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/appointments/:id/confirm`
pub async fn confirm(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusReply, ApiError> {
    let appt = ctx.with_db(|conn| appointment::confirm(conn, &id))?;
    Ok(Json(StatusMessage {
        message: "Appointment confirmed",
        status: appt.status,
    }))
}

/// `POST /api/appointments/:id/cancel`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusReply, ApiError> {
    let appt = ctx.with_db(|conn| appointment::cancel(conn, &id))?;
    Ok(Json(StatusMessage {
        message: "Appointment cancelled",
        status: appt.status,
    }))
}

/// `POST /api/appointments/:id/complete`
pub async fn complete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusReply, ApiError> {
    let appt = ctx.with_db(|conn| appointment::complete(conn, &id))?;
    Ok(Json(StatusMessage {
        message: "Appointment marked as completed",
        status: appt.status,
    }))
}

/// `POST /api/appointments/:id/reschedule`
pub async fn reschedule(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<RescheduleInput>,
) -> Result<Json<MessageData<AppointmentView>>, ApiError> {
    let view = ctx.with_db(|conn| appointment::reschedule(conn, &id, input))?;
    Ok(Json(MessageData {
        message: "Appointment rescheduled",
        data: view,
    }))
}
