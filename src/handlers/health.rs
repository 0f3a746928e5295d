use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use http::StatusCode;
use serde_json::json;

use crate::AppState;

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_up = crate::db::ping(&state.db).await;
    let status = if db_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if db_up { "ok" } else { "degraded" },
            "database": if db_up { "up" } else { "down" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}
