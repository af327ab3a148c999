//! Image storage backends.
//!
//! Both backends accept the same [`ImageUpload`] and apply the same validation
//! before writing anything: the MIME type must start with `image/` and the file
//! must not exceed the configured size ceiling.
//!
//! Stored references name their backend. Local references are public paths
//! under the upload prefix; remote references carry [`REMOTE_REFERENCE_PREFIX`]
//! in front of the API's file id. [`ImageStores`] uses that to send each delete
//! to the backend that owns the file.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Writes images into a publicly served directory
pub mod local;
/// Stores images through a third-party file-sharing API
pub mod remote;

pub use local::LocalImageStore;
pub use remote::{REMOTE_REFERENCE_PREFIX, RemoteImageStore};

/// Backend that receives new content item images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
    /// The public upload directory
    #[default]
    Local,
    /// The file-sharing API
    Remote,
}

/// An image received from the admin panel, not yet stored
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name
    pub filename: String,
    /// MIME type reported by the client
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Where an image ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    /// URL (remote) or relative public path (local) to show the image
    pub url: String,
    /// Reference to pass to [`ImageStore::delete`]
    pub reference: String,
}

/// Storage for content images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Validates and stores an image.
    ///
    /// # Errors
    /// Returns `Error::UploadRejected` without writing anything when the file
    /// is not an image or is too large; other variants for backend failures.
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage>;

    /// Deletes a previously stored image by its reference.
    async fn delete(&self, reference: &str) -> Result<()>;
}

/// Both backends behind one [`ImageStore`].
///
/// Uploads go to the configured item backend. Deletes are dispatched on the
/// reference, so an item keeps working after the item backend is switched.
#[derive(Debug, Clone)]
pub struct ImageStores {
    local: Arc<LocalImageStore>,
    remote: Option<Arc<RemoteImageStore>>,
    item_backend: ImageBackend,
}

impl ImageStores {
    /// Combines the stores; `item_backend` picks where new item images go
    #[must_use]
    pub const fn new(
        local: Arc<LocalImageStore>,
        remote: Option<Arc<RemoteImageStore>>,
        item_backend: ImageBackend,
    ) -> Self {
        Self {
            local,
            remote,
            item_backend,
        }
    }

    /// The public upload directory
    #[must_use]
    pub fn local(&self) -> &LocalImageStore {
        &self.local
    }

    /// The file-sharing API.
    ///
    /// # Errors
    /// Returns `Error::Storage` if no `[remote_storage]` section was configured
    pub fn remote(&self) -> Result<&RemoteImageStore> {
        self.remote.as_deref().ok_or_else(|| Error::Storage {
            message: "Remote storage is not configured".to_string(),
        })
    }

    /// Backend owning `reference`
    #[must_use]
    pub fn backend_of(reference: &str) -> ImageBackend {
        if reference.starts_with(REMOTE_REFERENCE_PREFIX) {
            ImageBackend::Remote
        } else {
            ImageBackend::Local
        }
    }

    fn store_for(&self, backend: ImageBackend) -> Result<&dyn ImageStore> {
        match backend {
            ImageBackend::Local => Ok(self.local()),
            ImageBackend::Remote => Ok(self.remote()?),
        }
    }
}

#[async_trait]
impl ImageStore for ImageStores {
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage> {
        self.store_for(self.item_backend)?.upload(upload).await
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let backend = Self::backend_of(reference);
        debug!("Deleting {reference} from the {backend:?} store");
        self.store_for(backend)?.delete(reference).await
    }
}

/// Rejects anything that is not a non-empty image no larger than `max_bytes`.
///
/// # Errors
/// Returns `Error::UploadRejected` naming the failed rule
pub fn validate_image(upload: &ImageUpload, max_bytes: usize) -> Result<()> {
    if !upload.content_type.starts_with("image/") {
        return Err(Error::UploadRejected {
            reason: format!(
                "Only image files are allowed (got '{}')",
                upload.content_type
            ),
        });
    }
    if upload.bytes.is_empty() {
        return Err(Error::UploadRejected {
            reason: "File is empty".to_string(),
        });
    }
    if upload.bytes.len() > max_bytes {
        return Err(Error::UploadRejected {
            reason: format!(
                "File is {} bytes; the limit is {max_bytes} bytes",
                upload.bytes.len()
            ),
        });
    }
    Ok(())
}

/// Reduces a client-supplied file name to a safe single path component.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '-');
    if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed.to_string()
    }
}
