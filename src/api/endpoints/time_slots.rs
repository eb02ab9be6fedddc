//! Time slot endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::db;
use crate::models::TimeSlot;
use crate::scheduling::{self, CreateSlotsInput, CreatedSlots, TimeSlotInput};

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| Ok(db::list_time_slots(conn)?))?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<TimeSlotInput>,
) -> Result<(StatusCode, Json<TimeSlot>), ApiError> {
    let slot = ctx.with_db(|conn| scheduling::create_time_slot(conn, input))?;
    Ok((StatusCode::CREATED, Json(slot)))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<TimeSlot>, ApiError> {
    Ok(Json(ctx.with_db(|conn| scheduling::get_time_slot(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TimeSlotInput>,
) -> Result<Json<TimeSlot>, ApiError> {
    Ok(Json(ctx.with_db(|conn| scheduling::update_time_slot(conn, &id, input))?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| scheduling::delete_time_slot(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/time-slots/available`
pub async fn available(State(ctx): State<ApiContext>) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    Ok(Json(ctx.with_db(scheduling::available_slots)?))
}

/// `POST /api/time-slots/create_slots`
pub async fn create_slots(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<CreateSlotsInput>,
) -> Result<(StatusCode, Json<CreatedSlots>), ApiError> {
    let created = ctx.with_db(|conn| scheduling::create_slots(conn, input))?;
    Ok((StatusCode::CREATED, Json(created)))
}
