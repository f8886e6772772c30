//! Enquiry submitted from a property page

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workflow status shared by enquiries and contact messages
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    #[sea_orm(string_value = "new")]
    New,

    #[sea_orm(string_value = "in_progress")]
    InProgress,

    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enquiries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub property_id: Uuid,

    /// Set when the visitor was signed in
    pub user_id: Option<Uuid>,

    pub full_name: String,

    pub email: String,

    pub phone: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,

    pub investment_amount: Option<f64>,

    pub status: EnquiryStatus,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
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
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
