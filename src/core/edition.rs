//! Edition rollover business logic
//!
//! Starting a new edition registers the next edition year and makes it the
//! current year in the event settings. Content items and registrations of
//! earlier years are left as they are and stay reachable by their year.

use crate::{
    core::{
        confirmation::Confirmation,
        settings::{get_settings, write_if_revision},
    },
    entities::{Edition, edition, event_settings},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// Display label of an edition year
#[must_use]
pub fn edition_label(year: i32) -> String {
    format!("Edición {year}")
}

/// Result of a successful rollover
#[derive(Debug, Clone, Serialize)]
pub struct EditionRollover {
    /// Edition that was current before
    pub previous_year: i32,
    /// Newly registered edition
    pub edition: edition::Model,
    /// Settings after the rollover
    pub settings: event_settings::Model,
    /// Clients must re-fetch everything rather than patch local state
    pub reload: bool,
}

/// Lists all registered editions, oldest first.
pub async fn list_editions<C>(db: &C) -> Result<Vec<edition::Model>>
where
    C: ConnectionTrait,
{
    Edition::find()
        .order_by_asc(edition::Column::Year)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the edition record for `year`, creating it if needed.
pub async fn ensure_edition<C>(db: &C, year: i32) -> Result<edition::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = Edition::find()
        .filter(edition::Column::Year.eq(year))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let created = edition::ActiveModel {
        year: Set(year),
        label: Set(edition_label(year)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Registered edition {}", created.label);
    Ok(created)
}

/// Year the next edition gets when rolling over on `today`.
///
/// This is the calendar year after `today`, not the current edition plus one.
#[must_use]
pub fn next_edition_year(today: NaiveDate) -> i32 {
    today.year() + 1
}

/// Starts a new edition:
///
/// 1. Requires confirmation (irreversible).
/// 2. Computes the next year from the calendar date.
/// 3. Registers the edition labeled `"Edición {year}"`.
/// 4. Rewrites the settings with the same fields except `current_year`.
///
/// Steps 3 and 4 commit together.
///
/// # Errors
/// Returns `Error::ConfirmationRequired` when not confirmed,
/// `Error::EditionNotAdvanced` when the computed year would not move the current
/// edition forward, and database errors otherwise
#[instrument(skip(db))]
pub async fn start_new_edition(
    db: &DatabaseConnection,
    confirmation: Confirmation,
    today: NaiveDate,
) -> Result<EditionRollover> {
    confirmation.require("start new edition")?;

    let txn = db.begin().await?;

    let settings = get_settings(&txn).await?;
    let previous_year = settings.current_year;
    let next_year = next_edition_year(today);
    if next_year <= previous_year {
        return Err(Error::EditionNotAdvanced {
            current_year: previous_year,
            next_year,
        });
    }

    let edition = ensure_edition(&txn, next_year).await?;
    let changes = event_settings::ActiveModel {
        current_year: Set(next_year),
        ..Default::default()
    };
    let settings = write_if_revision(&txn, settings.revision, changes).await?;

    txn.commit().await?;

    info!("Started {} (previous edition {previous_year})", edition.label);
    Ok(EditionRollover {
        previous_year,
        edition,
        settings,
        reload: true,
    })
}
