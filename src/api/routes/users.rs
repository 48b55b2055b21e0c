use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.users.register(&req.nickname).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(UsersResponse { users }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {} does not exist", id)))?;
    Ok(Json(user))
}

pub async fn get_user_by_nickname(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .users
        .get_by_nickname(&nickname)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no user named '{}'", nickname)))?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
