use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use http::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::services::blocks::{
    BlockQuery, CreateBlockRequest, DispatchStatusRequest, UpdateBlockRequest, DEFAULT_PAGE_SIZE,
};
use crate::AppState;

/// Query-string shape of the filtered block listing. `status` takes a
/// comma-separated list; `"unbilled"` selects blocks with no status yet.
#[derive(Debug, Deserialize)]
pub struct ListBlocksParams {
    pub status: Option<String>,
    pub block_no: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub pit_no: Option<String>,
    pub grade: Option<String>,
    pub min_cbm: Option<Decimal>,
    pub max_cbm: Option<Decimal>,
    #[serde(default = "default_page_number")]
    pub page_number: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

fn default_page_number() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl From<ListBlocksParams> for BlockQuery {
    fn from(params: ListBlocksParams) -> Self {
        let statuses = params.status.map(|s| {
            s.split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        });
        BlockQuery {
            statuses,
            block_no: params.block_no,
            start_date: params.start_date,
            end_date: params.end_date,
            pit_no: params.pit_no,
            grade: params.grade,
            min_cbm: params.min_cbm,
            max_cbm: params.max_cbm,
            page_number: params.page_number,
            page_size: params.page_size,
            sort_by: params.sort_by,
            sort_direction: params.sort_direction,
        }
    }
}

async fn create_block(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::CreateBlocks)?;
    let block = state.blocks.create_block(request).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn list_blocks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListBlocksParams>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ViewBlocks)?;
    let page = state.blocks.list_blocks(params.into()).await?;
    Ok(Json(page))
}

async fn get_block(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ViewBlocks)?;
    let block = state.blocks.get_block(id).await?;
    Ok(Json(block))
}

async fn update_block(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBlockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::EditBlocks)?;
    let block = state.blocks.update_block(id, request).await?;
    Ok(Json(block))
}

async fn change_dispatch_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<DispatchStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::UpdateDispatchStatus)?;
    let block = state.blocks.change_dispatch_status(id, request).await?;
    Ok(Json(block))
}

pub fn block_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_block).get(list_blocks))
        .route("/:id", get(get_block).put(update_block))
        .route("/:id/status", post(change_dispatch_status))
}
