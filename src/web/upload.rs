//! Standalone image upload routes used by the admin panel's file pickers.
//!
//! Both upload routes take a multipart `file` field and answer with a
//! [`StoredImage`]. Rejected files produce a 400 before any storage write.

use super::{AppState, read_image};
use crate::{
    errors::Result,
    storage::{ImageStore, StoredImage},
};
use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use tracing::info;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload_local))
        .route("/api/upload/remote", post(upload_remote))
        .route("/api/upload/remote/{file_id}", delete(delete_remote))
}

async fn upload_local(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StoredImage>> {
    let upload = read_image(multipart).await?;
    let stored = state.images.local().upload(upload).await?;
    info!("Uploaded {} to the public directory", stored.url);
    Ok(Json(stored))
}

async fn upload_remote(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StoredImage>> {
    let store = state.images.remote()?;
    let upload = read_image(multipart).await?;
    let stored = store.upload(upload).await?;
    Ok(Json(stored))
}

async fn delete_remote(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode> {
    state.images.remote()?.delete(&file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
