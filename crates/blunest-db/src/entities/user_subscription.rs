//! A user's subscription mirrored from the payment gateway

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created at the gateway, awaiting the first payment
    #[sea_orm(string_value = "created")]
    Created,

    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,

    /// All billing cycles completed
    #[sea_orm(string_value = "expired")]
    Expired,

    /// Paused at the gateway
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub plan_id: Uuid,

    pub status: SubscriptionStatus,

    /// Gateway subscription id (unique), used to match webhooks
    #[sea_orm(unique)]
    pub gateway_subscription_id: Option<String>,

    pub gateway_plan_id: Option<String>,

    pub current_period_start: Option<ChronoDateTimeUtc>,

    pub current_period_end: Option<ChronoDateTimeUtc>,

    pub cancel_at_period_end: bool,

    pub cancelled_at: Option<ChronoDateTimeUtc>,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subscription_plan::Entity",
        from = "Column::PlanId",
        to = "super::subscription_plan::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Plan,
}

impl Related<super::subscription_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
