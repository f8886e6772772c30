//! Subscription plan catalogue

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Slug of the plan used when a user has no active subscription
pub const FREE_PLAN_SLUG: &str = "free";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Plan slug (unique): `free`, `ai_basic`, `ai_pro`, `ai_enterprise`
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub price_monthly: f64,

    pub price_yearly: Option<f64>,

    /// Analyses allowed per calendar month, 0 for unlimited
    pub analyses_per_month: i32,

    /// 0 for unlimited
    pub max_properties_comparison: i32,

    /// JSON array of agent slugs, or `["all"]`
    pub agents_access: Json,

    /// JSON array of marketing feature strings
    pub features: Json,

    pub is_active: bool,

    pub display_order: i32,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

impl Model {
    /// Whether this plan may run the given agent
    pub fn allows_agent(&self, agent_slug: &str) -> bool {
        self.agents_access
            .as_array()
            .map(|slugs| {
                slugs
                    .iter()
                    .filter_map(|s| s.as_str())
                    .any(|s| s == "all" || s == agent_slug)
            })
            .unwrap_or(false)
    }

    pub fn is_unlimited(&self) -> bool {
        self.analyses_per_month <= 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_subscription::Entity")]
    Subscriptions,
}

impl Related<super::user_subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
