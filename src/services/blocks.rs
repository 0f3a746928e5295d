//! Granite block stock management and the filtered/paginated query layer.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    Order, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::derivation::{derive_metrics, AllowancePolicy, DerivedMetrics, FormulaPreset};
use crate::entities::granite_block::{
    self, BlockStatus, Entity as BlockEntity, Grade, Model as BlockModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Filter used in list queries for the billing status. `Unbilled` matches
/// both NULL and the legacy `"UnBilled"` string.
pub const UNBILLED_FILTER: &str = "unbilled";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlockRequest {
    #[validate(length(min = 1, message = "Block number is required"))]
    pub block_no: String,
    pub pit_no: Option<String>,
    pub buyer_block_no: Option<String>,
    pub grade: Grade,
    pub length_mm: Decimal,
    pub width_mm: Decimal,
    pub height_mm: Decimal,
    /// `"volume"`, `"tonnage"`, or absent for no allowance. The two branches
    /// are mutually exclusive; the selected type clears the other's input.
    pub allowance_type: Option<String>,
    pub pre_allowance_mm: Option<Decimal>,
    pub tonnage_allowance: Option<Decimal>,
    pub quarried_on: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl CreateBlockRequest {
    fn allowance_policy(&self) -> Result<AllowancePolicy, ServiceError> {
        parse_allowance(
            self.allowance_type.as_deref(),
            self.pre_allowance_mm,
            self.tonnage_allowance,
        )
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBlockRequest {
    pub pit_no: Option<String>,
    pub buyer_block_no: Option<String>,
    pub grade: Option<Grade>,
    pub length_mm: Option<Decimal>,
    pub width_mm: Option<Decimal>,
    pub height_mm: Option<Decimal>,
    /// When present, replaces the allowance policy wholesale (`"none"` clears
    /// it); when absent, the stored policy is left untouched.
    pub allowance_type: Option<String>,
    pub pre_allowance_mm: Option<Decimal>,
    pub tonnage_allowance: Option<Decimal>,
    pub quarried_on: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Filter set for the paginated block listing.
#[derive(Debug, Default, Clone)]
pub struct BlockQuery {
    /// Status names; the special value `"unbilled"` selects NULL statuses.
    pub statuses: Option<Vec<String>>,
    pub block_no: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub pit_no: Option<String>,
    pub grade: Option<String>,
    pub min_cbm: Option<Decimal>,
    pub max_cbm: Option<Decimal>,
    pub page_number: u64,
    pub page_size: u64,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub id: Uuid,
    pub block_no: String,
    pub pit_no: Option<String>,
    pub buyer_block_no: Option<String>,
    pub grade: String,
    pub length_mm: Decimal,
    pub width_mm: Decimal,
    pub height_mm: Decimal,
    pub status: Option<String>,
    #[serde(flatten)]
    pub allowance: AllowancePolicy,
    pub quarried_on: DateTime<Utc>,
    pub note: Option<String>,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PagedBlocks {
    pub data: Vec<BlockResponse>,
    pub total_count: u64,
    pub page_number: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PagedBlocks {
    fn new(data: Vec<BlockResponse>, total_count: u64, page_number: u64, page_size: u64) -> Self {
        let total_pages = total_count.div_ceil(page_size);
        Self {
            has_next_page: page_number * page_size < total_count,
            has_previous_page: page_number > 1 && total_count > 0,
            data,
            total_count,
            page_number,
            page_size,
            total_pages,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct DispatchStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Clone)]
pub struct BlockService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl BlockService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(block_no = %request.block_no))]
    pub async fn create_block(
        &self,
        request: CreateBlockRequest,
    ) -> Result<BlockResponse, ServiceError> {
        request.validate()?;
        let now = Utc::now();
        let (allowance_type, pre_allowance_mm, tonnage_allowance) =
            allowance_columns(&request.allowance_policy()?);

        let model = granite_block::ActiveModel {
            id: Set(Uuid::new_v4()),
            block_no: Set(request.block_no),
            pit_no: Set(request.pit_no),
            buyer_block_no: Set(request.buyer_block_no),
            grade: Set(request.grade.to_string()),
            length_mm: Set(request.length_mm.max(Decimal::ZERO)),
            width_mm: Set(request.width_mm.max(Decimal::ZERO)),
            height_mm: Set(request.height_mm.max(Decimal::ZERO)),
            status: Set(None),
            allowance_type: Set(allowance_type),
            pre_allowance_mm: Set(pre_allowance_mm),
            tonnage_allowance: Set(tonnage_allowance),
            quarried_on: Set(request.quarried_on.unwrap_or(now)),
            note: Set(request.note),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let created = model.insert(&*self.db).await.map_err(unique_block_no_err)?;
        info!(block_id = %created.id, "block created");

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::BlockCreated {
                    block_id: created.id,
                    block_no: created.block_no.clone(),
                })
                .await;
        }
        Ok(to_response(created))
    }

    pub async fn get_block(&self, block_id: Uuid) -> Result<BlockResponse, ServiceError> {
        let model = BlockEntity::find_by_id(block_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("block {block_id} not found")))?;
        Ok(to_response(model))
    }

    /// Update a block's stock-entry fields. Rejected once the block has been
    /// billed; issued gate passes must not drift from their source data.
    #[instrument(skip(self, request), fields(block_id = %block_id))]
    pub async fn update_block(
        &self,
        block_id: Uuid,
        request: UpdateBlockRequest,
    ) -> Result<BlockResponse, ServiceError> {
        request.validate()?;
        let model = BlockEntity::find_by_id(block_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("block {block_id} not found")))?;

        if !is_unbilled(model.status.as_deref()) {
            return Err(ServiceError::Conflict(format!(
                "block {} has already been billed and cannot be edited",
                model.block_no
            )));
        }

        let mut active = model.into_active_model();
        if let Some(pit_no) = request.pit_no {
            active.pit_no = Set(Some(pit_no));
        }
        if let Some(buyer_block_no) = request.buyer_block_no {
            active.buyer_block_no = Set(Some(buyer_block_no));
        }
        if let Some(grade) = request.grade {
            active.grade = Set(grade.to_string());
        }
        if let Some(length_mm) = request.length_mm {
            active.length_mm = Set(length_mm.max(Decimal::ZERO));
        }
        if let Some(width_mm) = request.width_mm {
            active.width_mm = Set(width_mm.max(Decimal::ZERO));
        }
        if let Some(height_mm) = request.height_mm {
            active.height_mm = Set(height_mm.max(Decimal::ZERO));
        }
        if request.allowance_type.is_some() {
            let policy = parse_allowance(
                request.allowance_type.as_deref(),
                request.pre_allowance_mm,
                request.tonnage_allowance,
            )?;
            let (allowance_type, pre, tonnage) = allowance_columns(&policy);
            active.allowance_type = Set(allowance_type);
            active.pre_allowance_mm = Set(pre);
            active.tonnage_allowance = Set(tonnage);
        }
        if let Some(quarried_on) = request.quarried_on {
            active.quarried_on = Set(quarried_on);
        }
        if let Some(note) = request.note {
            active.note = Set(Some(note));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        if let Some(sender) = &self.event_sender {
            sender.send(Event::BlockUpdated { block_id }).await;
        }
        Ok(to_response(updated))
    }

    /// Advance a billed block through the dispatch stages. Billing itself is
    /// owned by the invoice reconciler and is not reachable from here.
    #[instrument(skip(self), fields(block_id = %block_id, status = %request.status))]
    pub async fn change_dispatch_status(
        &self,
        block_id: Uuid,
        request: DispatchStatusRequest,
    ) -> Result<BlockResponse, ServiceError> {
        request.validate()?;
        let next = BlockStatus::from_str(&request.status).map_err(|_| {
            ServiceError::InvalidInput(format!("unknown status '{}'", request.status))
        })?;

        let model = BlockEntity::find_by_id(block_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("block {block_id} not found")))?;

        let current = model
            .status
            .as_deref()
            .and_then(|s| BlockStatus::from_str(s).ok())
            .ok_or_else(|| {
                ServiceError::InvalidStatus(format!(
                    "block {} is not billed yet, no dispatch status applies",
                    model.block_no
                ))
            })?;

        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot move block {} from {current} to {next}",
                model.block_no
            )));
        }

        let old_status = model.status.clone();
        let mut active = model.into_active_model();
        active.status = Set(Some(next.to_string()));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::BlockStatusChanged {
                    block_id,
                    old_status,
                    new_status: next.to_string(),
                })
                .await;
        }
        Ok(to_response(updated))
    }

    /// Filtered, sorted, paginated listing.
    ///
    /// CBM bounds apply to a derived field, so when either is present all
    /// raw-filter matches are materialized and filtered in memory before
    /// paging. That path is O(matching rows) per page, not O(page size); the
    /// raw filters should narrow the set first.
    #[instrument(skip(self, query))]
    pub async fn list_blocks(&self, query: BlockQuery) -> Result<PagedBlocks, ServiceError> {
        let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
        let page_number = query.page_number.max(1);

        let (sort_column, sort_order) = sort_spec(&query)?;
        let condition = filter_condition(&query);

        let finder = BlockEntity::find()
            .filter(condition)
            .order_by(sort_column, sort_order);

        if query.min_cbm.is_some() || query.max_cbm.is_some() {
            let rows = finder.all(&*self.db).await?;
            let filtered: Vec<BlockResponse> = rows
                .into_iter()
                .map(to_response)
                .filter(|b| within_cbm_bounds(b.metrics.quarry_cbm, &query))
                .collect();

            let total_count = filtered.len() as u64;
            let data = filtered
                .into_iter()
                .skip(((page_number - 1) * page_size) as usize)
                .take(page_size as usize)
                .collect();
            return Ok(PagedBlocks::new(data, total_count, page_number, page_size));
        }

        let paginator = finder.paginate(&*self.db, page_size);
        let total_count = paginator.num_items().await?;
        let data = paginator
            .fetch_page(page_number - 1)
            .await?
            .into_iter()
            .map(to_response)
            .collect();
        Ok(PagedBlocks::new(data, total_count, page_number, page_size))
    }
}

fn is_unbilled(status: Option<&str>) -> bool {
    matches!(status, None | Some("UnBilled"))
}

fn within_cbm_bounds(quarry_cbm: Decimal, query: &BlockQuery) -> bool {
    if let Some(min) = query.min_cbm {
        if quarry_cbm < min {
            return false;
        }
    }
    if let Some(max) = query.max_cbm {
        if quarry_cbm > max {
            return false;
        }
    }
    true
}

fn sort_spec(query: &BlockQuery) -> Result<(granite_block::Column, Order), ServiceError> {
    let column = match query.sort_by.as_deref().unwrap_or("date") {
        "date" | "quarried_on" => granite_block::Column::QuarriedOn,
        "block_no" => granite_block::Column::BlockNo,
        "grade" => granite_block::Column::Grade,
        "created_at" => granite_block::Column::CreatedAt,
        other => {
            return Err(ServiceError::InvalidInput(format!(
                "unsupported sort field '{other}'"
            )))
        }
    };
    let order = match query.sort_direction.as_deref() {
        Some("asc") => Order::Asc,
        None | Some("desc") => Order::Desc,
        Some(other) => {
            return Err(ServiceError::InvalidInput(format!(
                "unsupported sort direction '{other}'"
            )))
        }
    };
    Ok((column, order))
}

fn filter_condition(query: &BlockQuery) -> Condition {
    let mut condition = Condition::all();

    if let Some(block_no) = &query.block_no {
        condition = condition.add(granite_block::Column::BlockNo.eq(block_no.as_str()));
    }
    if let Some(pit_no) = &query.pit_no {
        condition = condition.add(granite_block::Column::PitNo.eq(pit_no.as_str()));
    }
    if let Some(grade) = &query.grade {
        condition = condition.add(granite_block::Column::Grade.eq(grade.as_str()));
    }

    // Date window defaults to the last one month when neither bound is set.
    let (start, end) = match (query.start_date, query.end_date) {
        (None, None) => (Some(Utc::now() - Duration::days(30)), Some(Utc::now())),
        bounds => bounds,
    };
    if let Some(start) = start {
        condition = condition.add(granite_block::Column::QuarriedOn.gte(start));
    }
    if let Some(end) = end {
        condition = condition.add(granite_block::Column::QuarriedOn.lte(end));
    }

    if let Some(statuses) = &query.statuses {
        let mut status_cond = Condition::any();
        for status in statuses {
            if status.eq_ignore_ascii_case(UNBILLED_FILTER) {
                status_cond = status_cond
                    .add(granite_block::Column::Status.is_null())
                    .add(granite_block::Column::Status.eq("UnBilled"));
            } else {
                status_cond = status_cond.add(granite_block::Column::Status.eq(status.as_str()));
            }
        }
        condition = condition.add(status_cond);
    }
    condition
}

fn parse_allowance(
    allowance_type: Option<&str>,
    pre_allowance_mm: Option<Decimal>,
    tonnage_allowance: Option<Decimal>,
) -> Result<AllowancePolicy, ServiceError> {
    match allowance_type {
        None | Some("none") | Some("") => Ok(AllowancePolicy::None),
        Some("volume") => Ok(AllowancePolicy::Volume {
            pre_allowance_mm: pre_allowance_mm.unwrap_or_default(),
        }),
        Some("tonnage") => Ok(AllowancePolicy::Tonnage {
            tonnage_allowance: tonnage_allowance.unwrap_or_default(),
        }),
        Some(other) => Err(ServiceError::InvalidInput(format!(
            "unknown allowance type '{other}'"
        ))),
    }
}

fn allowance_columns(
    policy: &AllowancePolicy,
) -> (Option<String>, Option<Decimal>, Option<Decimal>) {
    match policy {
        AllowancePolicy::None => (None, None, None),
        AllowancePolicy::Volume { pre_allowance_mm } => (
            Some("volume".to_string()),
            Some((*pre_allowance_mm).max(Decimal::ZERO)),
            None,
        ),
        AllowancePolicy::Tonnage { tonnage_allowance } => (
            Some("tonnage".to_string()),
            None,
            Some((*tonnage_allowance).max(Decimal::ZERO)),
        ),
    }
}

pub(crate) fn to_response(model: BlockModel) -> BlockResponse {
    let allowance = model.allowance_policy();
    let metrics = derive_metrics(&model.measurement(), &FormulaPreset::Standard(allowance));
    BlockResponse {
        id: model.id,
        block_no: model.block_no,
        pit_no: model.pit_no,
        buyer_block_no: model.buyer_block_no,
        grade: model.grade,
        length_mm: model.length_mm,
        width_mm: model.width_mm,
        height_mm: model.height_mm,
        status: model.status,
        allowance,
        quarried_on: model.quarried_on,
        note: model.note,
        metrics,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn unique_block_no_err(err: sea_orm::DbErr) -> ServiceError {
    if matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ) {
        ServiceError::Conflict("a block with this block number already exists".to_string())
    } else {
        ServiceError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: u64, number: u64, size: u64) -> PagedBlocks {
        PagedBlocks::new(Vec::new(), total, number, size)
    }

    #[test]
    fn pagination_identities() {
        let p = page(45, 2, 20);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_previous_page);

        let last = page(45, 3, 20);
        assert!(!last.has_next_page);

        let empty = page(0, 1, 20);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_previous_page);
    }

    #[test]
    fn has_next_page_matches_the_count_inequality() {
        for total in [0u64, 1, 19, 20, 21, 99, 100, 101] {
            for number in 1u64..=6 {
                let p = page(total, number, 20);
                assert_eq!(p.has_next_page, number * 20 < total);
            }
        }
    }

    #[test]
    fn unbilled_matches_null_and_legacy_string() {
        assert!(is_unbilled(None));
        assert!(is_unbilled(Some("UnBilled")));
        assert!(!is_unbilled(Some("Billed")));
    }

    #[test]
    fn allowance_branches_are_mutually_exclusive() {
        use rust_decimal_macros::dec;
        // Selecting the volume branch drops any stray tonnage input.
        let policy = parse_allowance(Some("volume"), Some(dec!(10)), Some(dec!(0.5))).unwrap();
        assert_eq!(
            policy,
            AllowancePolicy::Volume {
                pre_allowance_mm: dec!(10)
            }
        );
        let policy = parse_allowance(Some("tonnage"), Some(dec!(10)), Some(dec!(0.5))).unwrap();
        assert_eq!(
            policy,
            AllowancePolicy::Tonnage {
                tonnage_allowance: dec!(0.5)
            }
        );
        assert!(parse_allowance(Some("weight"), None, None).is_err());
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let query = BlockQuery {
            sort_by: Some("tonnage".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            sort_spec(&query),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
