use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gate-pass invoice header. Immutable after creation; the bill-to fields are
/// a denormalized copy of the client at submission time, not a foreign key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub gate_pass_no: String,
    pub bill_to_name: String,
    pub bill_to_address: Option<String>,
    pub bill_to_country: Option<String>,
    pub bill_to_gstin: Option<String>,
    pub bill_to_phone: Option<String>,
    pub dispatch_date: Option<Date>,
    pub gp_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_line_item::Entity")]
    InvoiceLineItems,
}

impl Related<super::invoice_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
