//! Gate-pass invoice assembly and block billing reconciliation.
//!
//! Marking blocks billed and persisting the invoice must be all-or-nothing.
//! The store supports multi-statement transactions, so the reconciliation
//! runs inside one instead of the compensating-update protocol the original
//! workflow used; the observable contract is the same. Concurrent
//! submissions over overlapping blocks are serialized by the conditioned
//! UPDATE: the loser matches zero rows and aborts. There is no further
//! locking, which is a documented limitation.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::derivation::{derive_metrics, FormulaPreset};
use crate::entities::granite_block::{self, BlockStatus, Entity as BlockEntity};
use crate::entities::invoice::{self, Entity as InvoiceEntity};
use crate::entities::invoice_line_item::{self, Entity as LineItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::handlers::common::PaginationParams;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "Gate pass number is required"))]
    pub gate_pass_no: String,
    #[validate(length(min = 1, message = "Bill-to name is required"))]
    pub bill_to_name: String,
    pub bill_to_address: Option<String>,
    pub bill_to_country: Option<String>,
    pub bill_to_gstin: Option<String>,
    pub bill_to_phone: Option<String>,
    pub dispatch_date: Option<NaiveDate>,
    pub gp_type: Option<String>,
    pub notes: Option<String>,
    /// Blocks to bill, in gate-pass line order.
    #[validate(length(min = 1, message = "At least one block is required"))]
    pub block_nos: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub line_items: Vec<invoice_line_item::Model>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub line_count: u64,
}

#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl InvoiceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Reconcile and persist an invoice.
    ///
    /// Either every referenced block ends up `Billed` and exactly one invoice
    /// row (plus its line items) exists, or nothing changed. A block that is
    /// missing or already billed aborts the whole submission.
    #[instrument(skip(self, request), fields(gate_pass_no = %request.gate_pass_no))]
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceResponse, ServiceError> {
        request.validate()?;

        let txn = self.db.begin().await?;
        let result = self.reconcile(&txn, &request).await;
        match result {
            Ok(response) => {
                txn.commit().await?;
                info!(invoice_id = %response.invoice.id, "invoice created");
                if let Some(sender) = &self.event_sender {
                    sender
                        .send(Event::InvoiceCreated {
                            invoice_id: response.invoice.id,
                            gate_pass_no: response.invoice.gate_pass_no.clone(),
                            block_count: response.line_items.len(),
                        })
                        .await;
                }
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, "invoice reconciliation failed, rolling back");
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    async fn reconcile(
        &self,
        txn: &DatabaseTransaction,
        request: &CreateInvoiceRequest,
    ) -> Result<InvoiceResponse, ServiceError> {
        let invoice_id = Uuid::new_v4();
        let mut line_items = Vec::with_capacity(request.block_nos.len());

        for (index, block_no) in request.block_nos.iter().enumerate() {
            // Conditioned on the block still being unbilled; zero rows means
            // it is missing or a concurrent submission got there first.
            let updated = BlockEntity::update_many()
                .col_expr(
                    granite_block::Column::Status,
                    Expr::value(BlockStatus::Billed.to_string()),
                )
                .col_expr(granite_block::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(granite_block::Column::BlockNo.eq(block_no.as_str()))
                .filter(
                    Condition::any()
                        .add(granite_block::Column::Status.is_null())
                        .add(granite_block::Column::Status.eq(BlockStatus::UnBilled.to_string())),
                )
                .exec(txn)
                .await?;

            if updated.rows_affected == 0 {
                return Err(ServiceError::Conflict(format!(
                    "block {block_no} does not exist or has already been billed"
                )));
            }

            let block = BlockEntity::find()
                .filter(granite_block::Column::BlockNo.eq(block_no.as_str()))
                .one(txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::Internal(format!("block {block_no} vanished mid-reconciliation"))
                })?;

            let metrics = derive_metrics(
                &block.measurement(),
                &FormulaPreset::Standard(block.allowance_policy()),
            );
            line_items.push(invoice_line_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                line_number: Set((index + 1) as i32),
                block_no: Set(block.block_no),
                pit_no: Set(block.pit_no),
                grade: Set(block.grade),
                length_mm: Set(block.length_mm),
                width_mm: Set(block.width_mm),
                height_mm: Set(block.height_mm),
                quarry_cbm: Set(metrics.quarry_cbm),
                dmg_tonnage: Set(metrics.dmg_tonnage),
                gross_volume: Set(metrics.gross_volume),
                customer_tonnage: Set(metrics.customer_tonnage),
                net_cbm: Set(metrics.net_cbm),
            });
        }

        let header = invoice::ActiveModel {
            id: Set(invoice_id),
            gate_pass_no: Set(request.gate_pass_no.clone()),
            bill_to_name: Set(request.bill_to_name.clone()),
            bill_to_address: Set(request.bill_to_address.clone()),
            bill_to_country: Set(request.bill_to_country.clone()),
            bill_to_gstin: Set(request.bill_to_gstin.clone()),
            bill_to_phone: Set(request.bill_to_phone.clone()),
            dispatch_date: Set(request.dispatch_date),
            gp_type: Set(request.gp_type.clone()),
            notes: Set(request.notes.clone()),
            created_at: Set(Utc::now()),
        };
        let saved = header.insert(txn).await.map_err(|e| {
            if matches!(
                e.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ) {
                ServiceError::Conflict(format!(
                    "gate pass number '{}' is already in use",
                    request.gate_pass_no
                ))
            } else {
                ServiceError::Database(e)
            }
        })?;

        let mut saved_lines = Vec::with_capacity(line_items.len());
        for item in line_items {
            saved_lines.push(item.insert(txn).await?);
        }

        Ok(InvoiceResponse {
            invoice: saved,
            line_items: saved_lines,
        })
    }

    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<InvoiceResponse, ServiceError> {
        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("invoice {invoice_id} not found")))?;

        let line_items = LineItemEntity::find()
            .filter(invoice_line_item::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_line_item::Column::LineNumber)
            .all(&*self.db)
            .await?;

        Ok(InvoiceResponse {
            invoice,
            line_items,
        })
    }

    pub async fn list_invoices(
        &self,
        pagination: &PaginationParams,
    ) -> Result<(Vec<InvoiceSummary>, u64), ServiceError> {
        let paginator = InvoiceEntity::find()
            .order_by_desc(invoice::Column::CreatedAt)
            .paginate(&*self.db, pagination.per_page);

        let total = paginator.num_items().await?;
        let invoices = paginator.fetch_page(pagination.page.saturating_sub(1)).await?;

        let mut summaries = Vec::with_capacity(invoices.len());
        for inv in invoices {
            let line_count = LineItemEntity::find()
                .filter(invoice_line_item::Column::InvoiceId.eq(inv.id))
                .count(&*self.db)
                .await?;
            summaries.push(InvoiceSummary {
                invoice: inv,
                line_count,
            });
        }
        Ok((summaries, total))
    }
}
