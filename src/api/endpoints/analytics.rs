//! Analytics endpoints and the live dashboard.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::db;
use crate::models::{Analytics, DashboardCounts};
use crate::reporting::{self, AnalyticsInput};

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Analytics>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| Ok(db::list_analytics(conn)?))?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<AnalyticsInput>,
) -> Result<(StatusCode, Json<Analytics>), ApiError> {
    let row = ctx.with_db(|conn| reporting::create_analytics(conn, input))?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Analytics>, ApiError> {
    Ok(Json(ctx.with_db(|conn| reporting::get_analytics(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AnalyticsInput>,
) -> Result<Json<Analytics>, ApiError> {
    Ok(Json(ctx.with_db(|conn| reporting::update_analytics(conn, &id, input))?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| reporting::delete_analytics(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/analytics/dashboard`
pub async fn dashboard(State(ctx): State<ApiContext>) -> Result<Json<DashboardCounts>, ApiError> {
    Ok(Json(ctx.with_db(reporting::dashboard_counts)?))
}
