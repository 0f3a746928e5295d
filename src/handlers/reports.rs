use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

async fn billing_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require(Capability::ViewReports)?;
    let report = state
        .reports
        .billing_summary(params.start_date, params.end_date)
        .await?;
    Ok(Json(report))
}

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/billing-summary", get(billing_summary))
}
