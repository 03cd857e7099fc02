use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Direction of a stock movement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// Append-only ledger row: one quantity change against an inventory, with
/// before/after snapshots. Never updated or deleted once written.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub movement_date: DateTime<Utc>,
    pub reference_no: String,
    /// Stored as string; convert through [`MovementType`].
    pub movement_type: String,
    pub storage_id: Uuid,
    pub item_id: Uuid,
    pub quantity_before: i32,
    /// Signed delta: positive for IN, negative for OUT.
    pub quantity: i32,
    pub quantity_after: i32,
    pub remark: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory::Entity",
        from = "Column::InventoryId",
        to = "super::inventory::Column::Id"
    )]
    Inventory,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::MovementType;
    use std::str::FromStr;

    #[test]
    fn movement_type_round_trips_as_upper_case() {
        assert_eq!(MovementType::In.as_str(), "IN");
        assert_eq!(MovementType::Out.as_str(), "OUT");
        assert_eq!(MovementType::from_str("OUT"), Ok(MovementType::Out));
        assert!(MovementType::from_str("SIDEWAYS").is_err());
    }
}
