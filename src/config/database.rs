//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Creation is idempotent, which lets the
//! server run it on every start.

use crate::entities::{
    ContentBlock, ContentItem, Edition, EventSettings, Registration, content_block, content_item,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::{Index, IndexCreateStatement},
};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/edition_cms.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(parent) = sqlite_parent_dir(&database_url) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tracing::info!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Directory holding a file-backed `SQLite` database, if it has one.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

async fn create_table_for<E, C>(db: &C, entity: E) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

fn content_item_scope_index() -> IndexCreateStatement {
    Index::create()
        .name("idx_content_items_year_kind_position")
        .table(ContentItem)
        .col(content_item::Column::Year)
        .col(content_item::Column::Kind)
        .col(content_item::Column::Position)
        .if_not_exists()
        .to_owned()
}

fn content_block_key_index() -> IndexCreateStatement {
    Index::create()
        .name("idx_content_blocks_year_key")
        .table(ContentBlock)
        .col(content_block::Column::Year)
        .col(content_block::Column::Key)
        .unique()
        .if_not_exists()
        .to_owned()
}

/// Creates all necessary database tables and indexes if they do not exist yet.
///
/// The `(year, kind, position)` index is not unique; two concurrent saves may
/// briefly write the same rank.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    create_table_for(db, EventSettings).await?;
    create_table_for(db, Edition).await?;
    create_table_for(db, ContentItem).await?;
    create_table_for(db, ContentBlock).await?;
    create_table_for(db, Registration).await?;

    let builder = db.get_database_backend();
    db.execute(builder.build(&content_item_scope_index())).await?;
    db.execute(builder.build(&content_block_key_index())).await?;

    Ok(())
}
