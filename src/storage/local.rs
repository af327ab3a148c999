//! Local filesystem image store.
//!
//! Files are written into the configured upload directory, which the HTTP
//! layer serves under the public prefix. The returned URL doubles as the
//! delete reference.

use super::{ImageStore, ImageUpload, StoredImage, sanitize_filename, validate_image};
use crate::{
    config::app::UploadConfig,
    errors::{Error, Result},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

/// Stores images in a public directory on local disk
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    directory: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl LocalImageStore {
    /// Creates a store writing into `config.directory`
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_bytes: config.max_bytes,
        }
    }

    /// Maps a public path back to a file inside the upload directory.
    fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let name = reference
            .strip_prefix(&self.public_prefix)
            .unwrap_or(reference)
            .trim_start_matches('/');
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(Error::Validation {
                message: format!("'{reference}' is not a stored upload"),
            });
        }
        Ok(self.directory.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage> {
        validate_image(&upload, self.max_bytes)?;

        let name = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_filename(&upload.filename)
        );
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(&name);
        tokio::fs::write(&path, &upload.bytes).await?;
        info!("Stored {} bytes at {}", upload.bytes.len(), path.display());

        let url = format!("{}/{name}", self.public_prefix);
        Ok(StoredImage {
            reference: url.clone(),
            url,
        })
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let path = self.resolve(reference)?;
        debug!("Deleting local upload {}", path.display());
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }
}
