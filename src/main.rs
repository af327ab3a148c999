#![allow(clippy::result_large_err)]

use chrono::Utc;
use dotenvy::dotenv;
use edition_cms::{
    config::{self, database},
    core::{edition::ensure_edition, settings::ensure_settings},
    errors::Result,
    web::{self, AppState},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;
    info!("Successfully processed application configuration.");

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed the settings row and its edition on first start
    let settings = ensure_settings(&db, &app_config.event, Utc::now()).await?;
    ensure_edition(&db, settings.current_year).await?;
    info!(
        "Serving edition {} of {}",
        settings.current_year, settings.event_name
    );

    // 6. Run the HTTP server
    web::serve(AppState::new(db, app_config)).await
}
