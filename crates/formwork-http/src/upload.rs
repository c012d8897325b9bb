//! Temporary upload handles.
//!
//! The transport layer is expected to spool uploaded files to disk and hand
//! the engine a [`TempFile`] per file input. Fields read these handles from a
//! [`FileDict`] and pass them to an upload provider.

use std::path::{Path, PathBuf};

use formwork_core::utils::MultiValueDict;
use serde::{Deserialize, Serialize};

/// A file spooled to a temporary location by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempFile {
    /// Location of the spooled content.
    pub path: PathBuf,
    /// The original filename as provided by the client.
    pub name: String,
    /// Size of the content in bytes.
    pub size: u64,
    /// The MIME content type declared by the client.
    pub content_type: String,
}

impl TempFile {
    /// Creates a new `TempFile` handle.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
            content_type: "application/octet-stream".to_string(),
        }
    }

    /// Sets the declared content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Returns `true` if the client actually selected a file.
    ///
    /// Browsers submit an empty-named part for untouched file inputs.
    pub fn is_present(&self) -> bool {
        !self.name.is_empty()
    }

    /// Returns the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|ext| ext.to_str())
    }
}

/// An ordered dictionary of uploaded files keyed by input name.
///
/// # Examples
///
/// ```
/// use formwork_http::{FileDict, TempFile};
///
/// let mut files = FileDict::new();
/// files.insert("items_li0_photo", TempFile::new("/tmp/up1", "cat.png", 42));
/// assert_eq!(files.get("items_li0_photo").map(|f| f.size), Some(42));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileDict {
    data: MultiValueDict<String, TempFile>,
}

impl FileDict {
    /// Creates an empty `FileDict`.
    pub fn new() -> Self {
        Self {
            data: MultiValueDict::new(),
        }
    }

    /// Adds a file under the given input name.
    pub fn insert(&mut self, key: impl Into<String>, file: TempFile) {
        self.data.append(key.into(), file);
    }

    /// Returns the last file submitted under `key`.
    pub fn get(&self, key: &str) -> Option<&TempFile> {
        self.data.get(&key.to_string())
    }

    /// Returns every file submitted under `key`.
    pub fn get_list(&self, key: &str) -> Option<&Vec<TempFile>> {
        self.data.get_list(&key.to_string())
    }

    /// Returns `true` if a file was submitted under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_string())
    }

    /// Returns an iterator over the input names in submission order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns an iterator over `(key, files)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vec<TempFile>)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of distinct input names.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no files were submitted.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_file_new() {
        let file = TempFile::new("/tmp/abc", "report.pdf", 11);
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size, 11);
        assert_eq!(file.content_type, "application/octet-stream");
        assert!(file.is_present());
    }

    #[test]
    fn test_temp_file_extension() {
        assert_eq!(TempFile::new("/tmp/a", "photo.jpg", 0).extension(), Some("jpg"));
        assert!(TempFile::new("/tmp/a", "README", 0).extension().is_none());
    }

    #[test]
    fn test_temp_file_not_present() {
        assert!(!TempFile::new("/tmp/a", "", 0).is_present());
    }

    #[test]
    fn test_temp_file_content_type() {
        let file = TempFile::new("/tmp/a", "a.png", 1).with_content_type("image/png");
        assert_eq!(file.content_type, "image/png");
    }

    #[test]
    fn test_file_dict_order_and_lookup() {
        let mut files = FileDict::new();
        files.insert("b", TempFile::new("/tmp/1", "one.txt", 1));
        files.insert("a", TempFile::new("/tmp/2", "two.txt", 2));
        files.insert("b", TempFile::new("/tmp/3", "three.txt", 3));

        assert_eq!(files.len(), 2);
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(files.get("b").map(|f| f.name.as_str()), Some("three.txt"));
        assert_eq!(files.get_list("b").map(Vec::len), Some(2));
        assert!(files.contains_key("a"));
        assert!(!files.contains_key("c"));
    }
}
