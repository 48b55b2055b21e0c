use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{CreateSleepRecord, SleepRecord, UpdateSleepRecord};

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub records: Vec<SleepRecord>,
}

pub async fn create_record(
    State(state): State<AppState>,
    Json(req): Json<CreateSleepRecord>,
) -> Result<(StatusCode, Json<SleepRecord>), ApiError> {
    let record = state.records.create(req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_records(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let records = state.records.list_by_user(user_id).await?;
    Ok(Json(RecordsResponse { records }))
}

pub async fn get_record_by_date(
    State(state): State<AppState>,
    Path((user_id, sleep_date)): Path<(i64, NaiveDate)>,
) -> Result<Json<SleepRecord>, ApiError> {
    let record = state
        .records
        .get_by_user_and_date(user_id, sleep_date)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("no record for user {} on {}", user_id, sleep_date))
        })?;
    Ok(Json(record))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SleepRecord>, ApiError> {
    let record = state
        .records
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("record {} does not exist", id)))?;
    Ok(Json(record))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateSleepRecord>,
) -> Result<Json<SleepRecord>, ApiError> {
    let record = state.records.update(id, patch).await?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.records.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
