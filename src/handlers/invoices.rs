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
use crate::services::invoices::CreateInvoiceRequest;
use crate::AppState;

async fn create_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::CreateInvoices)?;
    let invoice = state.invoices.create_invoice(request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ViewInvoices)?;
    let invoice = state.invoices.get_invoice(id).await?;
    Ok(Json(invoice))
}

async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ViewInvoices)?;
    let pagination = pagination.clamped();
    let (invoices, total) = state.invoices.list_invoices(&pagination).await?;
    Ok(Json(PaginatedResponse::new(
        invoices,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invoice).get(list_invoices))
        .route("/:id", get(get_invoice))
}
