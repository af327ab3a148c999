//! Content block entity - single-document copy per edition (jersey, history, contact).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which block a row holds
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum BlockKey {
    /// Jersey description and images
    #[sea_orm(string_value = "jersey")]
    Jersey,
    /// Event history copy
    #[sea_orm(string_value = "history")]
    History,
    /// Contact information
    #[sea_orm(string_value = "contact")]
    Contact,
}

impl FromStr for BlockKey {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jersey" => Ok(Self::Jersey),
            "history" => Ok(Self::History),
            "contact" => Ok(Self::Contact),
            other => Err(crate::errors::Error::Validation {
                message: format!("Unknown content block '{other}'"),
            }),
        }
    }
}

/// Content block database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_blocks")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Edition year
    pub year: i32,
    /// Which block this is; unique together with `year`
    pub key: BlockKey,
    /// Free-form JSON object edited by the admin panel
    pub body: Json,
    /// When the block was last written
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
