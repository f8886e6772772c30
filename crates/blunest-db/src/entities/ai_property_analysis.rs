//! Stored result of a multi-agent property analysis

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_property_analyses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub property_id: Uuid,

    /// Per-agent results plus the synthesis
    pub analysis_data: Json,

    /// JSON array of agent slugs that ran
    pub agents_used: Json,

    pub execution_time_seconds: f64,

    pub tokens_used: i32,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
