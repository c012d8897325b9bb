//! Decoding of the flat submission payload into per-record payloads.
//!
//! A list field named `items` receives its records as prefixed keys:
//! `items_li<index>_<child>`. The index is the text between the prefix and
//! the next underscore; everything after that underscore is the child name,
//! which may itself contain underscores or dots. Keys that carry the prefix
//! but no index or no child name are ignored.

use std::collections::HashMap;
use std::fmt;

use formwork_http::{FileDict, QueryDict};
use serde_json::Value;

/// Returns the key prefix of the record at `index` of list field `field_name`.
///
/// # Examples
///
/// ```
/// use formwork_forms::list::item_prefix;
///
/// assert_eq!(item_prefix("items", 0), "items_li0_");
/// ```
pub fn item_prefix(field_name: &str, index: impl fmt::Display) -> String {
    format!("{field_name}_li{index}_")
}

/// Returns the key prefix of the blank template of list field `field_name`.
pub fn template_prefix(field_name: &str) -> String {
    format!("{field_name}_tmpl_")
}

/// Splits `key` into `(index, child name)` when it belongs to the list
/// whose record prefix is `prefix`.
fn split_key<'k>(key: &'k str, prefix: &str) -> Option<(&'k str, &'k str)> {
    let (index, child) = key.strip_prefix(prefix)?.split_once('_')?;
    if index.is_empty() || child.is_empty() {
        return None;
    }
    Some((index, child))
}

/// Reads the raw input submitted under `name`.
///
/// A single value becomes a string, repeated values become an array of
/// strings.
pub fn raw_input(body: &QueryDict, name: &str) -> Option<Value> {
    match body.get_list(name)?.as_slice() {
        [single] => Some(Value::String(single.clone())),
        many => Some(Value::Array(many.iter().cloned().map(Value::String).collect())),
    }
}

/// The submitted data of one record, keyed by child name.
#[derive(Debug, Clone, Default)]
pub struct RecordPayload {
    index: String,
    body: QueryDict,
    files: FileDict,
}

impl RecordPayload {
    /// The index token as submitted.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The index token read as a position in the previous value, if numeric.
    pub fn position(&self) -> Option<usize> {
        self.index.parse().ok()
    }

    /// Body values of this record, keyed by child name.
    pub const fn body(&self) -> &QueryDict {
        &self.body
    }

    /// Files of this record, keyed by child name.
    pub const fn files(&self) -> &FileDict {
        &self.files
    }
}

/// The records of one list field, in order of first appearance.
///
/// Indices are ordered by their first occurrence among the body keys, then
/// among the file keys. An index appearing only among the files still yields
/// a record.
#[derive(Debug, Clone, Default)]
pub struct ListPayload {
    records: Vec<RecordPayload>,
}

impl ListPayload {
    /// Groups the prefixed keys of `body` and `files` by record index.
    ///
    /// # Examples
    ///
    /// ```
    /// use formwork_forms::ListPayload;
    /// use formwork_http::{FileDict, QueryDict};
    ///
    /// let body = QueryDict::parse("items_li1_qty=2&items_li0_qty=5&title=x");
    /// let payload = ListPayload::decode("items", &body, &FileDict::new());
    /// let indices: Vec<_> = payload.records().iter().map(|r| r.index()).collect();
    /// assert_eq!(indices, ["1", "0"]);
    /// ```
    pub fn decode(field_name: &str, body: &QueryDict, files: &FileDict) -> Self {
        let prefix = format!("{field_name}_li");
        let mut payload = Self::default();
        let mut positions = HashMap::new();

        for (key, values) in body.iter() {
            let Some((index, child)) = split_key(key, &prefix) else {
                if key.starts_with(&prefix) {
                    tracing::trace!(key, "ignoring malformed list key");
                }
                continue;
            };
            let record = payload.record_mut(&mut positions, index);
            for value in values {
                record.body.append(child, value);
            }
        }

        for (key, uploads) in files.iter() {
            let Some((index, child)) = split_key(key, &prefix) else {
                continue;
            };
            let record = payload.record_mut(&mut positions, index);
            for upload in uploads {
                record.files.insert(child, upload.clone());
            }
        }

        payload
    }

    fn record_mut(&mut self, positions: &mut HashMap<String, usize>, index: &str) -> &mut RecordPayload {
        let slot = *positions.entry(index.to_string()).or_insert_with(|| {
            self.records.push(RecordPayload {
                index: index.to_string(),
                ..RecordPayload::default()
            });
            self.records.len() - 1
        });
        &mut self.records[slot]
    }

    /// The decoded records.
    pub fn records(&self) -> &[RecordPayload] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no record was submitted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
