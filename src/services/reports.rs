//! Billing summary reporting.
//!
//! Uses the `BillingSummaryEstimate` preset (2.7 / 0.95), which the legacy
//! report always used and which disagrees with the standard gate-pass
//! constants. The discrepancy is preserved on purpose; see
//! `crate::derivation`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;

use crate::derivation::{derive_metrics, FormulaPreset};
use crate::entities::granite_block::{self, Entity as BlockEntity};
use crate::errors::ServiceError;

#[derive(Debug, Serialize)]
pub struct GradeSummary {
    pub grade: String,
    pub block_count: u64,
    pub total_cbm: Decimal,
    pub estimated_tonnage: Decimal,
    pub estimated_net_cbm: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BillingSummaryReport {
    pub grades: Vec<GradeSummary>,
    pub total_blocks: u64,
    pub total_cbm: Decimal,
    pub estimated_tonnage: Decimal,
    pub estimated_net_cbm: Decimal,
}

#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Per-grade volume and estimated tonnage totals over an optional
    /// quarried-on window.
    #[instrument(skip(self))]
    pub async fn billing_summary(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<BillingSummaryReport, ServiceError> {
        let mut finder = BlockEntity::find();
        if let Some(start) = start_date {
            finder = finder.filter(granite_block::Column::QuarriedOn.gte(start));
        }
        if let Some(end) = end_date {
            finder = finder.filter(granite_block::Column::QuarriedOn.lte(end));
        }
        let blocks = finder.all(&*self.db).await?;

        let mut by_grade: BTreeMap<String, GradeSummary> = BTreeMap::new();
        for block in &blocks {
            let metrics = derive_metrics(
                &block.measurement(),
                &FormulaPreset::BillingSummaryEstimate,
            );
            let entry = by_grade
                .entry(block.grade.clone())
                .or_insert_with(|| GradeSummary {
                    grade: block.grade.clone(),
                    block_count: 0,
                    total_cbm: Decimal::ZERO,
                    estimated_tonnage: Decimal::ZERO,
                    estimated_net_cbm: Decimal::ZERO,
                });
            entry.block_count += 1;
            entry.total_cbm += metrics.quarry_cbm;
            entry.estimated_tonnage += metrics.dmg_tonnage;
            entry.estimated_net_cbm += metrics.net_cbm;
        }

        let mut report = BillingSummaryReport {
            total_blocks: blocks.len() as u64,
            total_cbm: Decimal::ZERO,
            estimated_tonnage: Decimal::ZERO,
            estimated_net_cbm: Decimal::ZERO,
            grades: Vec::new(),
        };
        for summary in by_grade.into_values() {
            report.total_cbm += summary.total_cbm;
            report.estimated_tonnage += summary.estimated_tonnage;
            report.estimated_net_cbm += summary.estimated_net_cbm;
            report.grades.push(summary);
        }
        Ok(report)
    }
}
