//! Message from the public contact form

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::enquiry::EnquiryStatus as ContactStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub email: String,

    pub phone: Option<String>,

    pub subject: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub status: ContactStatus,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
