//! HTTP interface: router, shared state, admin guard and server lifecycle.
//!
//! Handlers stay thin. They resolve the edition year, call into `core`, and
//! return JSON; every failure is an [`Error`] rendered by `web::error`.

use crate::{
    config::AppConfig,
    core::settings::get_settings,
    errors::{Error, Result},
    storage::{ImageStores, ImageUpload, LocalImageStore, RemoteImageStore},
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Request, State},
    http::{
        HeaderMap, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Runs a generic handler with the payload type matching a [`ContentKind`].
///
/// [`ContentKind`]: crate::entities::ContentKind
macro_rules! for_kind {
    ($kind:expr, $handler:ident($($arg:expr),* $(,)?)) => {{
        use $crate::core::payload::{
            FormFieldPayload, GalleryPayload, PhotoPayload, SlidePayload, SponsorPayload,
        };
        use $crate::entities::ContentKind;
        match $kind {
            ContentKind::Slide => $handler::<SlidePayload>($($arg),*).await,
            ContentKind::Sponsor => $handler::<SponsorPayload>($($arg),*).await,
            ContentKind::Gallery => $handler::<GalleryPayload>($($arg),*).await,
            ContentKind::Photo => $handler::<PhotoPayload>($($arg),*).await,
            ContentKind::FormField => $handler::<FormFieldPayload>($($arg),*).await,
        }
    }};
}

/// Admin routes for settings, rollover, content lists and blocks
pub mod admin;
/// `IntoResponse` for the crate error
pub mod error;
/// Unauthenticated routes used by the public site
pub mod public;
/// Image upload routes
pub mod upload;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Public upload directory and file-sharing API
    pub images: Arc<ImageStores>,
}

impl AppState {
    /// Builds the state and the image stores described by `config`
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let local = Arc::new(LocalImageStore::new(&config.uploads));
        let remote = config
            .remote_storage
            .as_ref()
            .map(|remote| Arc::new(RemoteImageStore::new(remote, config.uploads.max_bytes)));
        let images = ImageStores::new(local, remote, config.uploads.item_backend);
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            images: Arc::new(images),
        }
    }
}

/// `?year=` on list and block routes; defaults to the current edition
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct YearQuery {
    /// Edition year to address
    pub year: Option<i32>,
}

impl YearQuery {
    /// The requested year, or the current edition when none was given
    pub async fn resolve(self, db: &DatabaseConnection) -> Result<i32> {
        match self.year {
            Some(year) => Ok(year),
            None => Ok(get_settings(db).await?.current_year),
        }
    }
}

/// Reads the multipart field named `file` into an [`ImageUpload`].
///
/// # Errors
/// Returns `Error::UploadRejected` if the body is malformed, too large, or has
/// no `file` field
pub async fn read_image(mut multipart: Multipart) -> Result<ImageUpload> {
    let rejected = |e: axum::extract::multipart::MultipartError| Error::UploadRejected {
        reason: e.body_text(),
    };
    while let Some(field) = multipart.next_field().await.map_err(rejected)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(rejected)?;
        return Ok(ImageUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(Error::UploadRejected {
        reason: "Missing multipart field 'file'".to_string(),
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let authorized = match (state.config.admin_token.as_deref(), bearer_token(req.headers())) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    };
    if !authorized {
        warn!("Rejected unauthenticated {} {}", req.method(), req.uri().path());
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Admin authentication required" })),
        )
            .into_response();
    }
    next.run(req).await
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    // Leave room above the image ceiling so oversized files reach validation
    // and get a 400 instead of a bare 413.
    let body_limit = state.config.uploads.max_bytes.saturating_mul(2);
    let uploads_prefix = state
        .config
        .uploads
        .public_prefix
        .trim_end_matches('/')
        .to_string();
    let uploads_dir = ServeDir::new(&state.config.uploads.directory);

    let guarded = admin::routes()
        .merge(upload::routes())
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public::routes())
        .merge(guarded)
        .nest_service(&uploads_prefix, uploads_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails
pub async fn serve(state: AppState) -> Result<()> {
    if state.config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; every admin and upload route will answer 401");
    }

    let address = state.config.server.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix_signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
