//! Event settings business logic.
//!
//! The settings row is the one piece of process-wide shared state. Every write
//! goes through [`update_settings`] (or the edition rollover), which checks the
//! revision the caller read and fails on mismatch instead of silently
//! overwriting a concurrent edit.

use crate::{
    config::app::EventSeed,
    entities::{EventSettings, event_settings, event_settings::SETTINGS_ID},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Utc};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Editable settings fields. The current year only changes through edition rollover.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsUpdate {
    /// Display name of the event
    pub event_name: String,
    /// Start instant targeted by the countdown
    pub event_date: DateTime<Utc>,
    /// Maximum registrations per edition
    pub capacity: i32,
    /// Registration fee
    pub price: f64,
    /// How participants pay
    pub payment_method: String,
    /// Payment instructions
    pub payment_details: String,
    /// Whether the registration form accepts submissions
    pub registration_open: bool,
}

impl SettingsUpdate {
    fn validate(&self) -> Result<()> {
        if self.event_name.trim().is_empty() {
            return Err(Error::Validation {
                message: "Event name cannot be empty".to_string(),
            });
        }
        if self.capacity < 0 {
            return Err(Error::Validation {
                message: format!("Capacity cannot be negative (got {})", self.capacity),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::Validation {
                message: format!("Invalid price {}", self.price),
            });
        }
        Ok(())
    }
}

/// Reads the settings singleton.
///
/// # Errors
/// Returns `Error::ItemNotFound` if the row has not been created yet
pub async fn get_settings<C>(db: &C) -> Result<event_settings::Model>
where
    C: ConnectionTrait,
{
    EventSettings::find_by_id(SETTINGS_ID)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("settings", SETTINGS_ID))
}

/// Creates the settings row from the configured seed if it does not exist yet.
///
/// An existing row is returned untouched; configuration never overrides what
/// the admin panel saved.
#[instrument(skip(db, seed))]
pub async fn ensure_settings<C>(
    db: &C,
    seed: &EventSeed,
    now: DateTime<Utc>,
) -> Result<event_settings::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = EventSettings::find_by_id(SETTINGS_ID).one(db).await? {
        return Ok(existing);
    }

    let current_year = seed.current_year.unwrap_or_else(|| now.year());
    let event_date = seed.event_date.unwrap_or_else(|| {
        warn!("No event date configured; the countdown starts at the current time");
        now
    });
    let settings = event_settings::ActiveModel {
        id: Set(SETTINGS_ID),
        current_year: Set(current_year),
        event_name: Set(seed.name.clone()),
        event_date: Set(event_date),
        capacity: Set(seed.capacity),
        price: Set(seed.price),
        payment_method: Set(seed.payment_method.clone()),
        payment_details: Set(seed.payment_details.clone()),
        registration_open: Set(seed.registration_open),
        revision: Set(0),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!("Seeded event settings for edition {current_year}");
    Ok(settings)
}

/// Writes `changes` only if the stored revision still equals `expected_revision`,
/// bumping the revision. Returns the stored settings after the write.
pub(crate) async fn write_if_revision<C>(
    db: &C,
    expected_revision: i32,
    mut changes: event_settings::ActiveModel,
) -> Result<event_settings::Model>
where
    C: ConnectionTrait,
{
    changes.revision = Set(expected_revision + 1);
    changes.updated_at = Set(Utc::now());

    let result = EventSettings::update_many()
        .set(changes)
        .filter(event_settings::Column::Id.eq(SETTINGS_ID))
        .filter(event_settings::Column::Revision.eq(expected_revision))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let current = get_settings(db).await?;
        warn!(
            "Rejected settings write: expected revision {expected_revision}, found {}",
            current.revision
        );
        return Err(Error::RevisionConflict {
            expected: expected_revision,
            actual: current.revision,
        });
    }

    get_settings(db).await
}

/// Updates the editable settings fields.
///
/// # Errors
/// Returns `Error::Validation` for invalid values and `Error::RevisionConflict`
/// if someone saved the settings after `expected_revision` was read
#[instrument(skip(db, update))]
pub async fn update_settings<C>(
    db: &C,
    expected_revision: i32,
    update: SettingsUpdate,
) -> Result<event_settings::Model>
where
    C: ConnectionTrait,
{
    update.validate()?;

    let changes = event_settings::ActiveModel {
        event_name: Set(update.event_name.trim().to_string()),
        event_date: Set(update.event_date),
        capacity: Set(update.capacity),
        price: Set(update.price),
        payment_method: Set(update.payment_method),
        payment_details: Set(update.payment_details),
        registration_open: Set(update.registration_open),
        ..Default::default()
    };
    let saved = write_if_revision(db, expected_revision, changes).await?;
    info!("Settings saved at revision {}", saved.revision);
    Ok(saved)
}
