//! Content block business logic - single-document copy per edition.

use crate::{
    entities::{BlockKey, ContentBlock, content_block},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Reads the `key` block of `year`, if it has been written.
pub async fn get_block<C>(db: &C, year: i32, key: BlockKey) -> Result<Option<content_block::Model>>
where
    C: ConnectionTrait,
{
    ContentBlock::find()
        .filter(content_block::Column::Year.eq(year))
        .filter(content_block::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates or replaces the `key` block of `year`.
///
/// # Errors
/// Returns `Error::Validation` if `body` is not a JSON object
pub async fn upsert_block<C>(
    db: &C,
    year: i32,
    key: BlockKey,
    body: Json,
) -> Result<content_block::Model>
where
    C: ConnectionTrait,
{
    if !body.is_object() {
        return Err(Error::Validation {
            message: "Content block body must be a JSON object".to_string(),
        });
    }

    let now = Utc::now();
    let saved = match get_block(db, year, key).await? {
        Some(existing) => {
            let mut active: content_block::ActiveModel = existing.into();
            active.body = Set(body);
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            content_block::ActiveModel {
                year: Set(year),
                key: Set(key),
                body: Set(body),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    info!("Saved {key:?} block for {year}");
    Ok(saved)
}
