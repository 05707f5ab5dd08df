use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{services::alert_monitor::ConfigOverrides, AppState};

// POST /monitor/start  (optional JSON body of *_secs overrides)
pub async fn post_start(State(state): State<AppState>, body: Bytes) -> Response {
    let overrides = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<ConfigOverrides>(&body) {
            Ok(o) => Some(o),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid overrides: {e}") })),
                )
                    .into_response();
            }
        }
    };

    let outcome = state.monitor.start(overrides).await;
    (
        StatusCode::OK,
        Json(json!({ "outcome": outcome, "status": state.monitor.status() })),
    )
        .into_response()
}

// POST /monitor/stop
pub async fn post_stop(State(state): State<AppState>) -> Response {
    let outcome = state.monitor.stop().await;
    (
        StatusCode::OK,
        Json(json!({ "outcome": outcome, "status": state.monitor.status() })),
    )
        .into_response()
}

// GET /monitor/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.status())
}
