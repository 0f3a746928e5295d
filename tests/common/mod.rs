// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use gatepass_api::migrator::Migrator;
use gatepass_api::services::blocks::{BlockService, CreateBlockRequest};
use gatepass_api::services::invoices::InvoiceService;

/// Fresh in-memory SQLite database with the full schema applied.
///
/// A single connection is required: every pooled connection to
/// `sqlite::memory:` would otherwise get its own database.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    Arc::new(db)
}

pub fn block_service(db: &Arc<DatabaseConnection>) -> BlockService {
    BlockService::new(db.clone(), None)
}

pub fn invoice_service(db: &Arc<DatabaseConnection>) -> InvoiceService {
    InvoiceService::new(db.clone(), None)
}

/// Stock-entry request with sensible defaults for tests.
pub fn block_request(block_no: &str, quarried_on: DateTime<Utc>) -> CreateBlockRequest {
    serde_json::from_value(serde_json::json!({
        "block_no": block_no,
        "pit_no": "PIT-1",
        "grade": "A",
        "length_mm": 1000,
        "width_mm": 500,
        "height_mm": 300,
        "allowance_type": "volume",
        "pre_allowance_mm": 10,
        "quarried_on": quarried_on.to_rfc3339(),
    }))
    .expect("valid block request")
}

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}
