use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use http::StatusCode;
use uuid::Uuid;

use super::common::{PaginatedResponse, PaginationParams};
use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::services::clients::{CreateClientRequest, UpdateClientRequest};
use crate::AppState;

async fn create_client(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ManageClients)?;
    let client = state.clients.create_client(request).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ManageClients)?;
    let client = state.clients.get_client(id).await?;
    Ok(Json(client))
}

async fn update_client(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ManageClients)?;
    let client = state.clients.update_client(id, request).await?;
    Ok(Json(client))
}

async fn delete_client(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ManageClients)?;
    state.clients.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_clients(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ManageClients)?;
    let pagination = pagination.clamped();
    let (clients, total) = state.clients.list_clients(&pagination).await?;
    Ok(Json(PaginatedResponse::new(
        clients,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_client).get(list_clients))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}
