//! Analysis agent definition
//!
//! Each row is a system prompt plus model parameters. Admins edit prompts at
//! runtime; `version` increases on every edit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_agent_configurations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Stable agent slug (unique), e.g. `market_pulse`
    #[sea_orm(unique)]
    pub agent_slug: String,

    pub display_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub system_prompt: String,

    /// Model name, or `default` to let the client pick
    pub model: String,

    pub temperature: f64,

    pub max_tokens: i32,

    /// Lowest plan slug that unlocks this agent (informational)
    pub required_tier: String,

    pub display_order: i32,

    pub is_enabled: bool,

    pub version: i32,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
