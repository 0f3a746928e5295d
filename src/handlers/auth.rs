use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};

use crate::auth::{AuthError, LoginRequest};
use crate::AppState;

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
