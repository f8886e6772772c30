//! Property listing entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Listing status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    /// Publicly listed and open for enquiries
    #[sea_orm(string_value = "available")]
    Available,

    /// Under negotiation
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "sold")]
    Sold,

    /// Not yet published
    #[sea_orm(string_value = "draft")]
    Draft,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    /// Property UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Admin who created the listing
    pub owner_id: Option<Uuid>,

    pub category_id: Option<Uuid>,

    pub title: String,

    /// URL slug (unique), accepted wherever a property id is
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub location: String,

    pub city: Option<String>,

    pub state: Option<String>,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    /// Asking price in INR
    pub price: f64,

    pub bedrooms: i32,

    pub bathrooms: i32,

    pub area_sqft: f64,

    pub property_type: String,

    pub featured_image: Option<String>,

    /// JSON array of amenity names
    pub amenities: Json,

    pub status: PropertyStatus,

    pub is_featured: bool,

    /// Detail page view counter
    pub views: i32,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Category,

    #[sea_orm(has_many = "super::property_image::Entity")]
    Images,

    #[sea_orm(has_many = "super::property_specification::Entity")]
    Specifications,

    #[sea_orm(has_one = "super::property_group::Entity")]
    Group,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::property_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::property_specification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Specifications.def()
    }
}

impl Related<super::property_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
