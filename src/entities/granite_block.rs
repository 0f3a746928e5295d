use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::derivation::{AllowancePolicy, Measurement};

/// Inventory record for a quarried block. Derived metrics are never stored;
/// see `crate::derivation`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "granite_blocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub block_no: String,
    pub pit_no: Option<String>,
    pub buyer_block_no: Option<String>,
    pub grade: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub length_mm: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub width_mm: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub height_mm: Decimal,
    /// NULL means the block has not been billed yet.
    pub status: Option<String>,
    pub allowance_type: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub pre_allowance_mm: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub tonnage_allowance: Option<Decimal>,
    pub quarried_on: DateTimeUtc,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn measurement(&self) -> Measurement {
        Measurement::new(self.length_mm, self.width_mm, self.height_mm)
    }

    /// Reconstruct the allowance policy from the stored columns. An unknown
    /// or missing type degrades to no allowance rather than failing a read.
    pub fn allowance_policy(&self) -> AllowancePolicy {
        match self.allowance_type.as_deref() {
            Some("volume") => AllowancePolicy::Volume {
                pre_allowance_mm: self.pre_allowance_mm.unwrap_or_default(),
            },
            Some("tonnage") => AllowancePolicy::Tonnage {
                tonnage_allowance: self.tonnage_allowance.unwrap_or_default(),
            },
            _ => AllowancePolicy::None,
        }
    }
}

/// Category grade assigned at stock entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

/// Block lifecycle states beyond the implicit NULL (unbilled) state.
///
/// `UnBilled` exists for parity with legacy rows that stored the string
/// instead of NULL; the two are treated as equivalent everywhere.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum BlockStatus {
    UnBilled,
    Billed,
    ReadyForDispatch,
    LoadedOnTruck,
    AtPort,
    Shipped,
    Cancelled,
    InspectionCompleted,
}

impl BlockStatus {
    /// Dispatch-stage transition table. Billing itself is owned by the
    /// invoice reconciler and is deliberately absent here.
    pub fn can_transition_to(self, next: BlockStatus) -> bool {
        use BlockStatus::*;
        matches!(
            (self, next),
            (Billed, ReadyForDispatch)
                | (ReadyForDispatch, LoadedOnTruck)
                | (LoadedOnTruck, AtPort)
                | (AtPort, Shipped)
                | (ReadyForDispatch, Cancelled)
                | (ReadyForDispatch, InspectionCompleted)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::BlockStatus::*;

    #[test]
    fn dispatch_chain_is_ordered() {
        assert!(Billed.can_transition_to(ReadyForDispatch));
        assert!(ReadyForDispatch.can_transition_to(LoadedOnTruck));
        assert!(LoadedOnTruck.can_transition_to(AtPort));
        assert!(AtPort.can_transition_to(Shipped));
    }

    #[test]
    fn side_states_only_from_ready_for_dispatch() {
        assert!(ReadyForDispatch.can_transition_to(Cancelled));
        assert!(ReadyForDispatch.can_transition_to(InspectionCompleted));
        assert!(!LoadedOnTruck.can_transition_to(Cancelled));
        assert!(!AtPort.can_transition_to(InspectionCompleted));
    }

    #[test]
    fn no_backwards_or_skipping_moves() {
        assert!(!Shipped.can_transition_to(AtPort));
        assert!(!ReadyForDispatch.can_transition_to(Shipped));
        assert!(!Billed.can_transition_to(LoadedOnTruck));
        assert!(!UnBilled.can_transition_to(ReadyForDispatch));
    }
}
