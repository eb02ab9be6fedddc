//! Report endpoints. Creating a report means generating it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, MessageData};
use crate::db;
use crate::models::Report;
use crate::reporting::{self, ReportInput};

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Report>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| Ok(db::list_reports(conn)?))?))
}

/// `POST /api/reports/generate` (also served at `POST /api/reports`)
pub async fn generate(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<ReportInput>,
) -> Result<(StatusCode, Json<MessageData<Report>>), ApiError> {
    let report = ctx.with_db(|conn| reporting::generate_report(conn, input))?;
    Ok((
        StatusCode::CREATED,
        Json(MessageData {
            message: "Report generated successfully",
            data: report,
        }),
    ))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(ctx.with_db(|conn| reporting::get_report(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ReportInput>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(ctx.with_db(|conn| reporting::update_report(conn, &id, input))?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| reporting::delete_report(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}
