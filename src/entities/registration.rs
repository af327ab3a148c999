//! Registration entity - one participant sign-up for an edition.
//!
//! Registrations are never touched by edition rollover; older editions stay
//! queryable by their `year`. The event and payment details are copied from
//! the settings at submission, so a confirmation keeps showing the terms the
//! participant signed up under.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registration database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registrations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Edition year the participant registered for
    pub year: i32,
    /// Code shown on the confirmation page
    #[sea_orm(unique)]
    pub confirmation_code: String,
    /// Participant name
    pub full_name: String,
    /// Participant email
    pub email: String,
    /// Answers to the edition's form fields, keyed by field label
    pub answers: Json,
    /// Event name at submission
    pub event_name: String,
    /// Event start at submission
    pub event_date: DateTimeUtc,
    /// Fee at submission
    pub price: f64,
    /// Payment method at submission
    pub payment_method: String,
    /// Payment instructions at submission
    pub payment_details: String,
    /// When the registration was submitted
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
