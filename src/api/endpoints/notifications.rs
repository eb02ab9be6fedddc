//! Notification endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::db;
use crate::models::Notification;
use crate::notifications::{self, NotificationInput};

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub message: &'static str,
    pub is_read: bool,
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| Ok(db::list_notifications(conn)?))?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<NotificationInput>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = ctx.with_db(|conn| notifications::create_notification(conn, input))?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    Ok(Json(ctx.with_db(|conn| notifications::get_notification(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NotificationInput>,
) -> Result<Json<Notification>, ApiError> {
    Ok(Json(ctx.with_db(|conn| notifications::update_notification(conn, &id, input))?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| notifications::delete_notification(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/notifications/user_notifications?user_id=`
pub async fn user_notifications(
    State(ctx): State<ApiContext>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let user_id = query.user_id;
    Ok(Json(ctx.with_db(|conn| {
        notifications::user_notifications(conn, user_id.as_deref())
    })?))
}

/// `POST /api/notifications/:id/mark_read`
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let notification = ctx.with_db(|conn| notifications::mark_read(conn, &id))?;
    Ok(Json(MarkReadResponse {
        message: "Notification marked as read",
        is_read: notification.is_read,
    }))
}
