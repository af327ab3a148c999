//! Edition entity - registry of edition years and their display labels.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Edition database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "editions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Edition year
    #[sea_orm(unique)]
    pub year: i32,
    /// Display label, e.g. `"Edición 2027"`
    pub label: String,
    /// When the edition was registered
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
