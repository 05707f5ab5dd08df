use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::WatchError,
    models::{Direction, NewWatch, PriceSample, Watch, WatchId},
    AppState,
};

const DEFAULT_PRICE_LIMIT: usize = 20;
const MAX_PRICE_LIMIT: usize = 500;

fn error_response(e: WatchError) -> Response {
    let status = match &e {
        WatchError::Validation(_) => StatusCode::BAD_REQUEST,
        WatchError::Duplicate { .. } => StatusCode::CONFLICT,
        WatchError::NotFound(_) => StatusCode::NOT_FOUND,
        WatchError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "store unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

fn watch_json(w: &Watch) -> serde_json::Value {
    json!({
        "id": w.id.0,
        "owner": w.owner,
        "destination": w.destination,
        "symbol": w.symbol,
        "target_price": w.target_price,
        "direction": w.direction,
        "created_at": w.created_at,
        "last_checked_at": w.last_checked_at,
        "last_alerted_at": w.last_alerted_at,
        "alert_count": w.alert_count,
    })
}

fn parse_direction(raw: Option<&str>) -> Result<Direction, WatchError> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("above") => Ok(Direction::Above),
        Some("below") => Ok(Direction::Below),
        Some(other) => Err(WatchError::Validation(format!(
            "direction must be \"above\" or \"below\", got {other:?}"
        ))),
    }
}

#[derive(Deserialize)]
pub struct CreateWatchBody {
    pub destination: String,
    pub symbol: String,
    pub target_price: f64,
    #[serde(default)]
    pub direction: Option<String>,
}

// POST /users/:owner/watches
pub async fn post_create_watch(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    payload: Result<Json<CreateWatchBody>, JsonRejection>,
) -> Response {
    // a body that doesn't deserialize is a validation error like any other
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    let direction = match parse_direction(body.direction.as_deref()) {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };

    let new = NewWatch {
        owner,
        destination: body.destination,
        symbol: body.symbol,
        target_price: body.target_price,
        direction,
        created_at: Utc::now().timestamp(),
    };

    match state.store.add_watch(new).await {
        Ok(w) => (StatusCode::CREATED, Json(watch_json(&w))).into_response(),
        Err(e) => error_response(e),
    }
}

// GET /users/:owner/watches
pub async fn get_watches(State(state): State<AppState>, Path(owner): Path<String>) -> Response {
    match state.store.list_watches(&owner).await {
        Ok(watches) => {
            let items: Vec<serde_json::Value> = watches.iter().map(watch_json).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => error_response(e),
    }
}

// DELETE /users/:owner/watches/:id
pub async fn delete_watch(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, i64)>,
) -> Response {
    match state.store.remove_watch(&owner, WatchId(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// GET /stats
pub async fn get_stats(State(state): State<AppState>) -> Response {
    match state.store.statistics(Utc::now().timestamp()).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "active_watch_count": stats.active_watch_count,
                "alerts_sent_today": stats.alerts_sent_today,
                "alerts_sent_total": stats.alerts_sent_total,
                "monitor": state.monitor.status(),
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct PricesQuery {
    pub limit: Option<usize>,
}

// GET /prices/:symbol
pub async fn get_prices(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(q): Query<PricesQuery>,
) -> Response {
    let limit = q.limit.unwrap_or(DEFAULT_PRICE_LIMIT).clamp(1, MAX_PRICE_LIMIT);

    match state.store.recent_prices(&symbol, limit).await {
        Ok(samples) => (StatusCode::OK, Json::<Vec<PriceSample>>(samples)).into_response(),
        Err(e) => error_response(e),
    }
}
