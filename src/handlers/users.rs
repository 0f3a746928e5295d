use axum::{
    extract::State,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use http::StatusCode;

use crate::auth::{AuthUser, Capability, CreateUserRequest};
use crate::errors::ServiceError;
use crate::AppState;

async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ManageUsers)?;
    let created = state.auth.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ManageUsers)?;
    let users = state.auth.list_users().await?;
    Ok(Json(users))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(list_users))
}
