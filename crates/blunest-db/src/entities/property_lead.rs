//! Sales lead generated by user interest actions

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Action that produced the lead
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum LeadType {
    #[sea_orm(string_value = "enquiry")]
    Enquiry,

    #[sea_orm(string_value = "join_group")]
    JoinGroup,

    #[sea_orm(string_value = "investment_intent")]
    InvestmentIntent,

    #[sea_orm(string_value = "site_visit")]
    SiteVisit,

    #[sea_orm(string_value = "callback")]
    Callback,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[sea_orm(string_value = "new")]
    New,

    #[sea_orm(string_value = "in_progress")]
    InProgress,

    #[sea_orm(string_value = "closed")]
    Closed,

    /// Lead turned into a group membership
    #[sea_orm(string_value = "converted")]
    Converted,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_leads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub property_id: Option<Uuid>,

    pub user_id: Option<Uuid>,

    pub lead_type: LeadType,

    pub full_name: String,

    pub email: String,

    pub phone: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,

    pub status: LeadStatus,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    /// Admin handling the lead
    pub assigned_to: Option<Uuid>,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
