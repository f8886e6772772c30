//! Co-investment group attached to a property
//!
//! One group per property. `filled_slots` counts pending and approved
//! members and never exceeds `total_slots`; writers must claim a slot with a
//! conditional update inside a transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group lifecycle status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Accepting members
    #[sea_orm(string_value = "open")]
    Open,

    /// Every slot is taken
    #[sea_orm(string_value = "full")]
    Full,

    /// Closed by an admin
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl GroupStatus {
    /// Status implied by slot counts; `Closed` is sticky until an admin reopens
    pub fn derive(current: GroupStatus, filled_slots: i32, total_slots: i32) -> GroupStatus {
        match current {
            GroupStatus::Closed => GroupStatus::Closed,
            _ if filled_slots >= total_slots => GroupStatus::Full,
            _ => GroupStatus::Open,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Property this group invests in (unique)
    #[sea_orm(unique)]
    pub property_id: Uuid,

    pub total_slots: i32,

    pub filled_slots: i32,

    /// Locked groups reject new members regardless of free slots
    pub is_locked: bool,

    pub status: GroupStatus,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

impl Model {
    pub fn has_free_slot(&self) -> bool {
        self.filled_slots < self.total_slots
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Property,

    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status_from_slots() {
        assert_eq!(GroupStatus::derive(GroupStatus::Open, 4, 5), GroupStatus::Open);
        assert_eq!(GroupStatus::derive(GroupStatus::Open, 5, 5), GroupStatus::Full);
        assert_eq!(GroupStatus::derive(GroupStatus::Full, 3, 5), GroupStatus::Open);
        assert_eq!(
            GroupStatus::derive(GroupStatus::Closed, 5, 5),
            GroupStatus::Closed
        );
    }
}
