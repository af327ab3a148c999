//! File-sharing API image store.
//!
//! The API accepts a multipart `file` part at `POST {base_url}/files` and
//! answers with the server-assigned file id and its public URL. Files are
//! deleted with `DELETE {base_url}/files/{id}`. The delete reference is the
//! file id behind [`REMOTE_REFERENCE_PREFIX`]; a bare id is accepted as well.

use super::{ImageStore, ImageUpload, StoredImage, validate_image};
use crate::{
    config::app::RemoteStorageConfig,
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::{
    Client, Response,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tracing::{error, info};

/// Marks a stored reference as a file-sharing API id
pub const REMOTE_REFERENCE_PREFIX: &str = "remote:";

/// Response body of a successful upload
#[derive(Debug, Deserialize)]
struct RemoteFile {
    id: String,
    url: String,
}

/// Stores images through the third-party file-sharing API
#[derive(Debug, Clone)]
pub struct RemoteImageStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_bytes: usize,
}

impl RemoteImageStore {
    /// Creates a store talking to `config.base_url`
    #[must_use]
    pub fn new(config: &RemoteStorageConfig, max_bytes: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_bytes,
        }
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn check(response: Response, action: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("File-sharing API {action} failed with {status}: {body}");
        Err(Error::Storage {
            message: format!("File-sharing API {action} failed with status {status}"),
        })
    }
}

#[async_trait]
impl ImageStore for RemoteImageStore {
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage> {
        validate_image(&upload, self.max_bytes)?;

        let size = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(self.files_url()))
            .multipart(form)
            .send()
            .await?;
        let file: RemoteFile = Self::check(response, "upload").await?.json().await?;
        info!("Uploaded {size} bytes to file-sharing API as {}", file.id);

        Ok(StoredImage {
            url: file.url,
            reference: format!("{REMOTE_REFERENCE_PREFIX}{}", file.id),
        })
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let file_id = reference
            .strip_prefix(REMOTE_REFERENCE_PREFIX)
            .unwrap_or(reference);
        let url = format!("{}/{file_id}", self.files_url());
        let response = self.authorize(self.client.delete(url)).send().await?;
        Self::check(response, "delete").await?;
        info!("Deleted {file_id} from file-sharing API");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        config::app::UploadConfig,
        storage::{ImageBackend, ImageStores, LocalImageStore},
        test_utils::*,
    };
    use std::sync::Arc;

    fn store(base_url: String) -> RemoteImageStore {
        RemoteImageStore::new(
            &RemoteStorageConfig {
                base_url,
                api_key: Some("secret".to_string()),
            },
            1024,
        )
    }

    #[tokio::test]
    async fn test_upload_returns_remote_url_and_reference() -> Result<()> {
        let api = FakeFileApi::spawn().await;
        let store = store(api.base_url.clone());
        let stored = store.upload(test_image("maillot.jpg")).await?;
        assert_eq!(stored.reference, "remote:f-123");
        assert_eq!(stored.url, "https://cdn.test/maillot.jpg");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reports_api_failure() -> Result<()> {
        let api = FakeFileApi::spawn().await;
        let store = store(api.base_url.clone());
        store.delete("remote:f-123").await?;
        store.delete("f-123").await?;
        let missing = store.delete("f-999").await;
        assert!(matches!(missing, Err(Error::Storage { .. })));
        assert_eq!(api.deleted(), vec!["f-123", "f-123", "f-999"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_upload_never_reaches_api() {
        // Unroutable address: a request would fail with Error::Http, not UploadRejected
        let store = store("http://127.0.0.1:9".to_string());
        let result = store
            .upload(ImageUpload {
                filename: "notes.txt".to_string(),
                content_type: "text/plain".to_string(),
                bytes: vec![1],
            })
            .await;
        assert!(matches!(result, Err(Error::UploadRejected { .. })));
    }

    #[tokio::test]
    async fn test_combined_store_routes_by_reference() -> Result<()> {
        let api = FakeFileApi::spawn().await;
        let dir = tempfile::tempdir()?;
        let local = LocalImageStore::new(&UploadConfig {
            directory: dir.path().to_path_buf(),
            ..Default::default()
        });
        let stores = ImageStores::new(
            Arc::new(local),
            Some(Arc::new(store(api.base_url.clone()))),
            ImageBackend::Remote,
        );

        let stored = stores.upload(test_image("logo.png")).await?;
        assert_eq!(stored.reference, "remote:f-123");
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);

        let local_copy = stores.local().upload(test_image("logo.png")).await?;
        stores.delete(&local_copy.reference).await?;
        stores.delete(&stored.reference).await?;

        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        assert_eq!(api.deleted(), vec!["f-123"]);
        Ok(())
    }
}
