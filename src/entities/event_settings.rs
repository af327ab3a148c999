//! Event settings entity - the singleton row holding global event configuration.
//!
//! Only the row with id [`SETTINGS_ID`] is ever used. `revision` is bumped on
//! every write so concurrent editors can detect lost updates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the one settings row
pub const SETTINGS_ID: i32 = 1;

/// Event settings database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_settings")]
pub struct Model {
    /// Always [`SETTINGS_ID`]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// Active edition; selects which year's content public pages show
    pub current_year: i32,
    /// Display name of the event
    pub event_name: String,
    /// Start instant of the event, targeted by the countdown
    pub event_date: DateTimeUtc,
    /// Maximum number of registrations per edition
    pub capacity: i32,
    /// Registration fee
    pub price: f64,
    /// How participants pay (e.g. "Transferencia")
    pub payment_method: String,
    /// Account number or other payment instructions
    pub payment_details: String,
    /// Whether the public registration form accepts submissions
    pub registration_open: bool,
    /// Optimistic concurrency token
    pub revision: i32,
    /// When the settings were last written
    pub updated_at: DateTimeUtc,
}

/// `EventSettings` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
