use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::service::DEFAULT_WINDOW_DAYS;

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub user_id: i64,
    pub window_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub user_id: i64,
    pub backend: &'static str,
    pub advice: String,
}

pub async fn generate_advice(
    State(state): State<AppState>,
    Json(req): Json<AdviceRequest>,
) -> Result<Json<AdviceResponse>, ApiError> {
    let window_days = req.window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let recent = state.stats.recent_daily(req.user_id, window_days).await?;
    let weekday = state.stats.weekday_averages(req.user_id).await?;

    let advice = state.advisor.advise(&recent, &weekday).await?;

    Ok(Json(AdviceResponse {
        user_id: req.user_id,
        backend: state.advisor.backend_name(),
        advice,
    }))
}

#[cfg(test)]
mod tests {
    use crate::advice::backend::MockBackend;
    use crate::advice::SleepAdvisor;
    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::models::CreateSleepRecord;
    use crate::storage::Database;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn setup_test_state(backend: MockBackend) -> AppState {
        let db = Database::open_in_memory().unwrap();
        AppState::new(db, SleepAdvisor::new(Arc::new(backend)))
    }

    async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_advice_returns_generated_text() {
        let state = setup_test_state(MockBackend::new("Go to bed before midnight."));
        let user = state.users.register("ada").await.unwrap();
        state
            .records
            .create(CreateSleepRecord::new(
                user.id,
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                "2025-06-01T23:30",
                "2025-06-02T07:30",
            ))
            .await
            .unwrap();

        let app = build_router(state);
        let body = format!(r#"{{"user_id": {}}}"#, user.id);
        let (status, json) = post_json(app, "/api/advice", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["user_id"], user.id);
        assert_eq!(json["backend"], "mock");
        assert_eq!(json["advice"], "Go to bed before midnight.");
    }

    #[tokio::test]
    async fn test_advice_works_without_records() {
        let state = setup_test_state(MockBackend::new("Not much to go on yet."));

        let app = build_router(state);
        let (status, json) = post_json(app, "/api/advice", r#"{"user_id": 1}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["advice"], "Not much to go on yet.");
    }

    #[tokio::test]
    async fn test_advice_backend_failure_returns_500() {
        let state = setup_test_state(MockBackend::unavailable());

        let app = build_router(state);
        let (status, json) = post_json(app, "/api/advice", r#"{"user_id": 1}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_advice_zero_window_returns_400() {
        let state = setup_test_state(MockBackend::new("unused"));

        let app = build_router(state);
        let body = r#"{"user_id": 1, "window_days": 0}"#;
        let (status, _) = post_json(app, "/api/advice", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
