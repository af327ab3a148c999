//! Shared test utilities.
//!
//! Helpers for in-memory databases seeded with a settings row, an image
//! store that records what it was asked to do, and a stand-in file-sharing API.

use crate::{
    config::app::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES, EventSeed, RemoteStorageConfig, UploadConfig},
    core::settings::{SettingsUpdate, ensure_settings},
    errors::{Error, Result},
    storage::{ImageBackend, ImageStore, ImageUpload, StoredImage, validate_image},
    web::AppState,
};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Multipart, Path as UrlPath, State},
    http::StatusCode,
    response::Response,
    routing::{delete, post},
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};

/// Admin token configured by [`setup_test_state`]
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Installs a test-writer subscriber so `tracing` output shows up in failing tests.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Start instant used by every seeded settings row: 12 Sep 2026, 08:00 UTC
#[allow(clippy::unwrap_used)]
pub fn test_event_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 12, 8, 0, 0).unwrap()
}

/// Creates a test database whose settings row has `current_year` = `year`.
///
/// # Defaults
/// * capacity: 300
/// * price: 35.0
/// * registration open
/// * revision 0
pub async fn setup_test_db_with_settings(year: i32) -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    let seed = EventSeed {
        name: "Marcha Cicloturista".to_string(),
        current_year: Some(year),
        event_date: Some(test_event_date()),
        capacity: 300,
        price: 35.0,
        payment_method: "Transferencia".to_string(),
        payment_details: "ES00 0000 0000".to_string(),
        registration_open: true,
    };
    ensure_settings(&db, &seed, test_event_date()).await?;
    Ok(db)
}

/// App state over a 2026 test database with uploads written into `upload_dir`.
pub async fn setup_test_state(upload_dir: &Path) -> Result<AppState> {
    build_test_state(upload_dir, None).await
}

/// Like [`setup_test_state`], but item images go to the file-sharing API at `base_url`.
pub async fn setup_test_state_with_remote(upload_dir: &Path, base_url: &str) -> Result<AppState> {
    build_test_state(upload_dir, Some(base_url)).await
}

async fn build_test_state(upload_dir: &Path, remote_url: Option<&str>) -> Result<AppState> {
    init_test_tracing();
    let db = setup_test_db_with_settings(2026).await?;
    let config = AppConfig {
        uploads: UploadConfig {
            directory: upload_dir.to_path_buf(),
            item_backend: if remote_url.is_some() {
                ImageBackend::Remote
            } else {
                ImageBackend::Local
            },
            ..Default::default()
        },
        remote_storage: remote_url.map(|base_url| RemoteStorageConfig {
            base_url: base_url.to_string(),
            api_key: Some("test-api-key".to_string()),
        }),
        admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
        ..Default::default()
    };
    Ok(AppState::new(db, config))
}

/// File-sharing API stand-in on an ephemeral port.
///
/// Every upload answers with file id `f-123`. Deletes of `f-123` succeed and
/// any other id is a 404; every delete is recorded.
pub struct FakeFileApi {
    /// Base URL to configure the remote store with
    pub base_url: String,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl FakeFileApi {
    /// Starts the server in a background task
    #[allow(clippy::unwrap_used)]
    pub async fn spawn() -> Self {
        async fn upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
            while let Some(field) = multipart.next_field().await.unwrap() {
                if field.name() == Some("file") {
                    let name = field.file_name().unwrap_or("unnamed").to_string();
                    let _ = field.bytes().await.unwrap();
                    return (
                        StatusCode::OK,
                        Json(json!({"id": "f-123", "url": format!("https://cdn.test/{name}")})),
                    );
                }
            }
            (StatusCode::BAD_REQUEST, Json(json!({"error": "no file"})))
        }

        async fn remove(
            State(deleted): State<Arc<Mutex<Vec<String>>>>,
            UrlPath(id): UrlPath<String>,
        ) -> StatusCode {
            deleted.lock().unwrap().push(id.clone());
            if id == "f-123" {
                StatusCode::NO_CONTENT
            } else {
                StatusCode::NOT_FOUND
            }
        }

        let deleted = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/files", post(upload))
            .route("/files/{id}", delete(remove))
            .with_state(Arc::clone(&deleted));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}/"),
            deleted,
        }
    }

    /// File ids the API was asked to delete, in call order
    #[allow(clippy::unwrap_used)]
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

/// `Authorization` header value for [`TEST_ADMIN_TOKEN`]
pub fn admin_bearer() -> String {
    format!("Bearer {TEST_ADMIN_TOKEN}")
}

/// Reads a response body as JSON.
#[allow(clippy::unwrap_used)]
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A multipart body with one `file` field; returns (content type, body).
pub fn multipart_body(filename: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "XBOUNDARYX";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// A settings update equal to what [`setup_test_db_with_settings`] seeds.
pub fn test_settings_update() -> SettingsUpdate {
    SettingsUpdate {
        event_name: "Marcha Cicloturista".to_string(),
        event_date: test_event_date(),
        capacity: 300,
        price: 35.0,
        payment_method: "Transferencia".to_string(),
        payment_details: "ES00 0000 0000".to_string(),
        registration_open: true,
    }
}

/// A small PNG upload named `name`.
pub fn test_image(name: &str) -> ImageUpload {
    ImageUpload {
        filename: name.to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a],
    }
}

/// Image store keeping uploads and deletes in memory.
#[derive(Debug, Default)]
pub struct RecordingImageStore {
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_deletes: bool,
}

impl RecordingImageStore {
    /// A store whose every delete fails after being recorded
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Default::default()
        }
    }

    /// References passed to `upload`, in call order
    #[allow(clippy::unwrap_used)]
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    /// References passed to `delete`, in call order
    #[allow(clippy::unwrap_used)]
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    #[allow(clippy::unwrap_used)]
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage> {
        validate_image(&upload, DEFAULT_MAX_UPLOAD_BYTES)?;
        self.uploads.lock().unwrap().push(upload.filename.clone());
        Ok(StoredImage {
            url: format!("memory://{}", upload.filename),
            reference: upload.filename,
        })
    }

    #[allow(clippy::unwrap_used)]
    async fn delete(&self, reference: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(reference.to_string());
        if self.fail_deletes {
            return Err(Error::Storage {
                message: format!("refusing to delete {reference}"),
            });
        }
        Ok(())
    }
}
