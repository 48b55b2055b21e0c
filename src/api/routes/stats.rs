use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{DailyStat, WeekdayAverage};
use crate::service::DEFAULT_WINDOW_DAYS;

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub window_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RecentStatsResponse {
    pub user_id: i64,
    pub window_days: u32,
    pub stats: Vec<DailyStat>,
}

#[derive(Debug, Serialize)]
pub struct WeekdayStatsResponse {
    pub user_id: i64,
    pub averages: Vec<WeekdayAverage>,
}

pub async fn recent_stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<RecentParams>,
) -> Result<Json<RecentStatsResponse>, ApiError> {
    let window_days = params.window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let stats = state.stats.recent_daily(user_id, window_days).await?;
    Ok(Json(RecentStatsResponse {
        user_id,
        window_days,
        stats,
    }))
}

pub async fn weekday_averages(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<WeekdayStatsResponse>, ApiError> {
    let averages = state.stats.weekday_averages(user_id).await?;
    Ok(Json(WeekdayStatsResponse { user_id, averages }))
}
