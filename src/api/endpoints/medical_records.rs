//! Medical record endpoints, plus attaching medications and test results.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, MessageData};
use crate::models::MedicalRecordView;
use crate::records::{self, MedicalRecordInput, MedicationInput, TestResultInput};

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<MedicalRecordView>>, ApiError> {
    Ok(Json(ctx.with_db(records::list_records)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<MedicalRecordInput>,
) -> Result<(StatusCode, Json<MessageData<MedicalRecordView>>), ApiError> {
    let view = ctx.with_db(|conn| records::create_record(conn, input))?;
    Ok((
        StatusCode::CREATED,
        Json(MessageData {
            message: "Medical record created successfully",
            data: view,
        }),
    ))
}

pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MedicalRecordView>, ApiError> {
    Ok(Json(ctx.with_db(|conn| records::get_record(conn, &id))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MedicalRecordInput>,
) -> Result<Json<MedicalRecordView>, ApiError> {
    Ok(Json(ctx.with_db(|conn| records::update_record(conn, &id, input))?))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| records::delete_record(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/medical-records/:id/medications`
pub async fn add_medication(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MedicationInput>,
) -> Result<(StatusCode, Json<MessageData<MedicalRecordView>>), ApiError> {
    let view = ctx.with_db(|conn| records::add_medication(conn, &id, input))?;
    Ok((
        StatusCode::CREATED,
        Json(MessageData {
            message: "Medication added",
            data: view,
        }),
    ))
}

/// `POST /api/medical-records/:id/test_results`
pub async fn add_test_result(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TestResultInput>,
) -> Result<(StatusCode, Json<MessageData<MedicalRecordView>>), ApiError> {
    let view = ctx.with_db(|conn| records::add_test_result(conn, &id, input))?;
    Ok((
        StatusCode::CREATED,
        Json(MessageData {
            message: "Test result added",
            data: view,
        }),
    ))
}
