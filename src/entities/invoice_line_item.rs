use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a billed block at invoice time. Carries copies of the fields
/// needed for billing, including the derived metrics as they were computed at
/// submission, so later edits to the formula or the block cannot change an
/// issued gate pass.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub line_number: i32,
    pub block_no: String,
    pub pit_no: Option<String>,
    pub grade: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub length_mm: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub width_mm: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub height_mm: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quarry_cbm: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub dmg_tonnage: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub gross_volume: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub customer_tonnage: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub net_cbm: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
