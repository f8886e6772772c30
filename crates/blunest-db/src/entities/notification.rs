//! In-app notification

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// Free-form category such as `group`, `enquiry` or `subscription`
    pub kind: String,

    /// Relative link the client can navigate to
    pub link: Option<String>,

    pub is_read: bool,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
