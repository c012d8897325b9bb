//! Upload providers for file and picture fields.
//!
//! A file field hands each incoming [`TempFile`] to an [`UploadProvider`],
//! which persists it and reports where it went as a [`StoredFile`]. Failures
//! come back as an explicit [`UploadError`]; the field records them as
//! validation errors and keeps its previous value.
//!
//! Two providers ship with the crate: [`FileSystemStorage`], which copies
//! uploads under a directory with async IO, and [`MemoryStorage`], which only
//! records names and is meant for tests and previews.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use formwork_core::utils::text::sanitize_filename_part;
use formwork_core::Settings;
use formwork_http::TempFile;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The description of a persisted upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Provider-relative path of the stored file.
    pub path: String,
    /// Public URL of the stored file.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// Provider-specific extras (dimensions, public ids, ...).
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Why an upload provider rejected or lost a file.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file exceeds the provider's size limit.
    #[error("file {name} is {size} bytes, larger than the {limit} byte limit")]
    TooLarge {
        /// Client-supplied file name.
        name: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// The stored file to delete does not exist.
    #[error("stored file {0} does not exist")]
    Missing(String),

    /// The provider refused the file.
    #[error("upload rejected: {0}")]
    Rejected(String),

    /// An I/O error occurred while moving the file.
    #[error("upload IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A collaborator that persists uploaded files.
#[async_trait]
pub trait UploadProvider: Send + Sync + std::fmt::Debug {
    /// Persists `file` under `filename` and describes the stored result.
    async fn upload(&self, file: &TempFile, filename: &str) -> Result<StoredFile, UploadError>;

    /// Removes a previously stored file by its provider-relative path.
    async fn remove(&self, path: &str) -> Result<(), UploadError>;
}

/// Builds a storage-safe, collision-resistant filename for an upload.
///
/// The stem and extension are sanitized and a short random token is appended
/// to the stem.
///
/// # Examples
///
/// ```
/// use formwork_forms::storage::generate_filename;
///
/// let name = generate_filename("my photo (1).JPG");
/// assert!(name.starts_with("my_photo__1__"));
/// assert!(name.ends_with(".JPG"));
/// ```
pub fn generate_filename(original: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let token = &token[..8];
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => format!(
            "{}_{token}.{}",
            sanitize_filename_part(stem),
            sanitize_filename_part(ext)
        ),
        _ => format!("{}_{token}", sanitize_filename_part(original)),
    }
}

/// Filesystem-based upload provider.
///
/// Copies uploads into `location` using `tokio::fs` and removes the temporary
/// file afterwards.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    /// The directory where files are stored.
    pub location: PathBuf,
    /// The base URL for serving stored files.
    pub base_url: String,
    /// Largest accepted upload in bytes.
    pub max_size: u64,
}

impl FileSystemStorage {
    /// Creates a new filesystem storage rooted at `location`.
    pub fn new(location: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            base_url: base_url.into(),
            max_size: formwork_core::settings::DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Creates a storage from the upload section of the settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.upload_dir.clone(), settings.media_url.clone())
            .with_max_size(settings.max_upload_size)
    }

    /// Sets the size limit.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Returns the full filesystem path for a stored name.
    pub fn path(&self, name: &str) -> PathBuf {
        self.location.join(name)
    }

    /// Returns the URL for serving a stored name.
    pub fn url(&self, name: &str) -> String {
        format!("{}{name}", self.base_url)
    }
}

#[async_trait]
impl UploadProvider for FileSystemStorage {
    async fn upload(&self, file: &TempFile, filename: &str) -> Result<StoredFile, UploadError> {
        if file.size > self.max_size {
            return Err(UploadError::TooLarge {
                name: file.name.clone(),
                size: file.size,
                limit: self.max_size,
            });
        }

        tokio::fs::create_dir_all(&self.location).await?;
        let size = tokio::fs::copy(&file.path, self.path(filename)).await?;
        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            tracing::debug!(path = %file.path.display(), error = %e, "temporary upload not removed");
        }

        Ok(StoredFile {
            path: filename.to_string(),
            url: self.url(filename),
            size,
            metadata: Map::new(),
        })
    }

    async fn remove(&self, path: &str) -> Result<(), UploadError> {
        tokio::fs::remove_file(self.path(path)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                UploadError::Missing(path.to_string())
            } else {
                UploadError::Io(e)
            }
        })
    }
}

/// In-memory upload provider that records names without touching the disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    base_url: String,
    metadata: Map<String, Value>,
    reject: Option<String>,
    stored: Mutex<Vec<String>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory storage serving from `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Attaches provider metadata to every stored file.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Makes every upload fail with the given reason.
    #[must_use]
    pub fn rejecting(mut self, reason: impl Into<String>) -> Self {
        self.reject = Some(reason.into());
        self
    }

    /// Returns the names currently stored.
    pub fn stored(&self) -> Vec<String> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl UploadProvider for MemoryStorage {
    async fn upload(&self, file: &TempFile, filename: &str) -> Result<StoredFile, UploadError> {
        if let Some(reason) = &self.reject {
            return Err(UploadError::Rejected(reason.clone()));
        }
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(filename.to_string());
        Ok(StoredFile {
            path: filename.to_string(),
            url: format!("{}{filename}", self.base_url),
            size: file.size,
            metadata: self.metadata.clone(),
        })
    }

    async fn remove(&self, path: &str) -> Result<(), UploadError> {
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        let position = stored
            .iter()
            .position(|name| name == path)
            .ok_or_else(|| UploadError::Missing(path.to_string()))?;
        stored.remove(position);
        Ok(())
    }
}
