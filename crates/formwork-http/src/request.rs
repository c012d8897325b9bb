//! The request view handed to fields during a validation pass.

use std::collections::HashMap;

use crate::querydict::QueryDict;
use crate::upload::{FileDict, TempFile};

/// Submitted body data, uploaded files, and request metadata.
///
/// Composite fields validate each sub-record against a *view* of the request
/// produced by [`with_payload`](FormRequest::with_payload): the same request,
/// with `body` and `files` swapped for that sub-record's slice.
///
/// # Examples
///
/// ```
/// use formwork_http::{FormRequest, QueryDict};
///
/// let request = FormRequest::builder()
///     .body(QueryDict::parse("title=Hello"))
///     .meta("REMOTE_ADDR", "127.0.0.1")
///     .build();
/// assert_eq!(request.body.get("title"), Some("Hello"));
/// assert_eq!(request.meta("REMOTE_ADDR"), Some("127.0.0.1"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormRequest {
    /// The body namespace.
    pub body: QueryDict,
    /// The file namespace.
    pub files: FileDict,
    meta: HashMap<String, String>,
}

impl FormRequest {
    /// Creates a request from body data with no files.
    pub fn new(body: QueryDict) -> Self {
        Self {
            body,
            files: FileDict::new(),
            meta: HashMap::new(),
        }
    }

    /// Creates a new [`FormRequestBuilder`].
    pub fn builder() -> FormRequestBuilder {
        FormRequestBuilder::default()
    }

    /// Returns a copy of this request with `body` and `files` replaced.
    #[must_use]
    pub fn with_payload(&self, body: QueryDict, files: FileDict) -> Self {
        Self {
            body,
            files,
            meta: self.meta.clone(),
        }
    }

    /// Returns a metadata value by key.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}

/// Builder for [`FormRequest`].
#[derive(Debug, Default)]
pub struct FormRequestBuilder {
    body: QueryDict,
    files: FileDict,
    meta: HashMap<String, String>,
}

impl FormRequestBuilder {
    /// Sets the body data.
    #[must_use]
    pub fn body(mut self, body: QueryDict) -> Self {
        self.body = body;
        self
    }

    /// Adds an uploaded file under an input name.
    #[must_use]
    pub fn file(mut self, key: impl Into<String>, file: TempFile) -> Self {
        self.files.insert(key, file);
        self
    }

    /// Sets a metadata entry.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Builds the request.
    pub fn build(self) -> FormRequest {
        FormRequest {
            body: self.body,
            files: self.files,
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_has_no_files() {
        let request = FormRequest::new(QueryDict::parse("a=1"));
        assert_eq!(request.body.get("a"), Some("1"));
        assert!(request.files.is_empty());
    }

    #[test]
    fn test_builder_collects_files() {
        let request = FormRequest::builder()
            .file("doc", TempFile::new("/tmp/x", "x.txt", 3))
            .build();
        assert_eq!(request.files.get("doc").map(|f| f.size), Some(3));
    }

    #[test]
    fn test_with_payload_keeps_meta() {
        let request = FormRequest::builder()
            .body(QueryDict::parse("outer=1"))
            .meta("user", "alice")
            .build();
        let view = request.with_payload(QueryDict::parse("inner=2"), FileDict::new());
        assert_eq!(view.body.get("inner"), Some("2"));
        assert!(!view.body.contains_key("outer"));
        assert_eq!(view.meta("user"), Some("alice"));
        // The original is untouched.
        assert_eq!(request.body.get("outer"), Some("1"));
    }
}
