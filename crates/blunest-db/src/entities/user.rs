//! User profile entity
//!
//! Credentials live in the external identity provider; this table only holds
//! the profile and the application role keyed by the provider's user id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role in the marketplace
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular marketplace user
    #[sea_orm(string_value = "user")]
    User,

    /// Back-office administrator
    #[sea_orm(string_value = "admin")]
    Admin,

    /// Administrator allowed to manage other administrators
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
}

impl UserRole {
    /// Admin and super admin both have back-office access
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User UUID issued by the identity provider (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// User email (unique)
    #[sea_orm(unique)]
    pub email: String,

    pub full_name: Option<String>,

    pub phone: Option<String>,

    /// Application role
    pub role: UserRole,

    pub avatar_url: Option<String>,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
