//! System administrator endpoints: create, list, retrieve, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::db;
use crate::models::SystemAdmin;
use crate::registration::{self, AdminInput, WithPassword};

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<SystemAdmin>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| Ok(db::list_admins(conn)?))?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<WithPassword<AdminInput>>,
) -> Result<(StatusCode, Json<SystemAdmin>), ApiError> {
    let (input, password_hash) = body.into_parts().await?;
    let admin = ctx.with_db(|conn| {
        registration::register_admin(conn, input, password_hash.as_deref())
    })?;
    Ok((StatusCode::CREATED, Json(admin)))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<SystemAdmin>, ApiError> {
    Ok(Json(ctx.with_db(|conn| registration::get_admin(conn, &id))?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| registration::delete_admin(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}
