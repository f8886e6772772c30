//! Membership of a user in a property group

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review state of a membership
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Waiting for admin review; holds a slot
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "approved")]
    Approved,

    /// Rejected by an admin; the slot is released
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl MemberStatus {
    /// Whether a member in this state counts towards `filled_slots`
    pub fn holds_slot(self) -> bool {
        !matches!(self, MemberStatus::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub group_id: Uuid,

    /// Registered user; unique together with `group_id`
    pub user_id: Option<Uuid>,

    pub full_name: String,

    pub email: String,

    pub phone: Option<String>,

    pub investment_amount: Option<f64>,

    pub status: MemberStatus,

    pub joined_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property_group::Entity",
        from = "Column::GroupId",
        to = "super::property_group::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::property_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
