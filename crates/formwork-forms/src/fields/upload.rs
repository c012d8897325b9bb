//! Cleaning of file and picture fields.

use formwork_http::{FormRequest, TempFile};
use serde_json::{json, Value};
use tracing::warn;

use super::Field;
use crate::storage::{generate_filename, StoredFile, UploadProvider};

/// The shape of the value stored after a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Descriptor {
    /// `{path, url, size}`.
    File,
    /// Provider metadata plus `url`, `path`, `size`, `original_name`, `original_size`.
    Picture,
}

impl Descriptor {
    fn describe(self, stored: StoredFile, file: &TempFile) -> Value {
        match self {
            Self::File => json!({"path": stored.path, "url": stored.url, "size": stored.size}),
            Self::Picture => {
                let mut picture = stored.metadata;
                picture.insert("url".into(), Value::String(stored.url));
                picture.insert("path".into(), Value::String(stored.path));
                picture.insert("size".into(), stored.size.into());
                picture.insert("original_name".into(), Value::String(file.name.clone()));
                picture.insert("original_size".into(), file.size.into());
                Value::Object(picture)
            }
        }
    }
}

async fn remove_stored(storage: &dyn UploadProvider, field: &str, path: &str) {
    if let Err(e) = storage.remove(path).await {
        warn!(field, path, error = %e, "failed to remove stored file");
    }
}

/// Replaces, clears, or keeps the stored file of `field`.
///
/// A new upload replaces the previous file only once it has been stored. A
/// clear request without a new upload removes the previous file. A failed
/// upload is recorded as an error and keeps the previous value.
pub(super) async fn clean_upload(
    field: &mut Field,
    storage: &dyn UploadProvider,
    request: &FormRequest,
    descriptor: Descriptor,
) {
    let clear_key = format!("{}_clear", field.name);
    let clear = request.body.get(&clear_key).is_some_and(|v| !v.is_empty());
    let incoming = request.files.get(&field.name).filter(|f| f.is_present());
    let previous = field
        .value
        .get("path")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(file) = incoming {
        let filename = generate_filename(&file.name);
        match storage.upload(file, &filename).await {
            Ok(stored) => {
                if let Some(path) = &previous {
                    remove_stored(storage, &field.name, path).await;
                }
                tracing::debug!(field = %field.name, path = %stored.path, "stored upload");
                field.value = descriptor.describe(stored, file);
            }
            Err(e) => {
                warn!(field = %field.name, file = %file.name, error = %e, "upload failed");
                field
                    .errors
                    .push(format!("upload of {} failed: {e}", file.name));
            }
        }
    } else if clear {
        if let Some(path) = &previous {
            remove_stored(storage, &field.name, path).await;
        }
        field.value = Value::Null;
    }

    if field.value.as_object().map_or(true, serde_json::Map::is_empty) {
        field.value = Value::Null;
    }
}
