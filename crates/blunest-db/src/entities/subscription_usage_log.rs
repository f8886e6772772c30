//! Metered usage of paid features

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    #[sea_orm(string_value = "ai_analysis")]
    AiAnalysis,

    #[sea_orm(string_value = "property_comparison")]
    PropertyComparison,

    #[sea_orm(string_value = "export_report")]
    ExportReport,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_usage_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub subscription_id: Option<Uuid>,

    pub usage_type: UsageType,

    pub property_id: Option<Uuid>,

    pub metadata: Json,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
