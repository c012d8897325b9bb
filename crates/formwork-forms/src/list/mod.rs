//! The composite list field.
//!
//! A [`ListField`] validates a variable-length sequence of records, each
//! record holding one value per declared child field. Records arrive through
//! the flat payload under prefixed keys (see [`decode`]), are validated
//! concurrently child by child (see [`clean`]), and render back under the
//! same key scheme (see [`render`]), so a rendered list can be resubmitted.
//!
//! A child declared under the reserved name [`SELF_FIELD`] stands for the
//! whole record: its value becomes the record itself, which makes lists of
//! scalars possible.

pub(crate) mod clean;
pub mod decode;
mod render;

use std::collections::BTreeMap;

use formwork_core::{FormworkError, FormworkResult};
use futures::future::join_all;
use serde_json::Value;

use crate::fields::{Field, FieldKind};
use crate::fieldset::Fieldset;
use crate::path::deep_read;
use crate::schema::{SchemaFragment, SchemaType};

pub use decode::{item_prefix, raw_input, template_prefix, ListPayload, RecordPayload};

/// The reserved child name whose value replaces the whole record.
pub const SELF_FIELD: &str = "__self__";

/// Error messages of one record, keyed by child name.
pub type ChildErrors = BTreeMap<String, Vec<String>>;

/// The composite part of a list field: child templates, fieldsets, and the
/// per-record errors of the last clean.
///
/// # Examples
///
/// ```
/// use formwork_forms::{Field, ListField};
///
/// let items = ListField::new([
///     ("qty", Field::number().required(true)),
///     ("note", Field::string()),
/// ])
/// .unwrap();
/// assert_eq!(items.field_names(), vec!["qty", "note"]);
/// let field = Field::list(items).bind("items");
/// assert_eq!(field.records().len(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ListField {
    fields: Vec<(String, Field)>,
    fieldsets: Vec<Fieldset>,
    children_errors: Vec<ChildErrors>,
}

impl ListField {
    /// Declares a list field from `(child name, field)` pairs.
    ///
    /// Fails with [`FormworkError::ImproperlyConfigured`] when no child is
    /// declared, a child name is empty, or a name is declared twice.
    pub fn new<N: Into<String>>(fields: impl IntoIterator<Item = (N, Field)>) -> FormworkResult<Self> {
        let mut declared: Vec<(String, Field)> = Vec::new();
        for (name, field) in fields {
            let name = name.into();
            if name.is_empty() {
                return Err(FormworkError::ImproperlyConfigured(
                    "list child fields need a name".into(),
                ));
            }
            if declared.iter().any(|(existing, _)| *existing == name) {
                return Err(FormworkError::ImproperlyConfigured(format!(
                    "list child field {name} declared twice"
                )));
            }
            let bound = field.bind(name.as_str());
            declared.push((name, bound));
        }
        if declared.is_empty() {
            return Err(FormworkError::ImproperlyConfigured(
                "list field requires at least one child field".into(),
            ));
        }
        Ok(Self {
            fields: declared,
            fieldsets: Vec::new(),
            children_errors: Vec::new(),
        })
    }

    /// Sets the fieldsets used when rendering records.
    #[must_use]
    pub fn with_fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets = fieldsets;
        self
    }

    /// The declared child names, in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Iterates over `(child name, template)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Looks up a child template by name.
    pub fn child(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find_map(|(child, field)| (child == name).then_some(field))
    }

    /// The declared fieldsets.
    pub fn fieldsets(&self) -> &[Fieldset] {
        &self.fieldsets
    }

    /// Per-record child errors of the last clean, parallel to the records.
    pub fn children_errors(&self) -> &[ChildErrors] {
        &self.children_errors
    }

    pub(crate) fn reset_children_errors(&mut self) {
        self.children_errors.clear();
    }

    /// Describes an array whose items are either the `__self__` child's
    /// schema or an object of the child schemas nested by dotted name.
    pub fn to_schema(&self) -> SchemaFragment {
        if let Some(own) = self.child(SELF_FIELD) {
            return SchemaFragment::array_of(own.to_schema());
        }
        let mut item = SchemaFragment::new(SchemaType::Object);
        for (name, field) in &self.fields {
            item.insert_path(name, field.to_schema());
        }
        SchemaFragment::array_of(item)
    }

    /// Hands every child template the column of its values across `records`
    /// and runs the templates' `pre_render` concurrently.
    pub(crate) async fn pre_render_children(&mut self, records: &Value) -> FormworkResult<()> {
        let records = records.as_array().map_or(&[][..], Vec::as_slice);
        let tasks = self.fields.iter_mut().map(|(child_name, template)| {
            let column = records
                .iter()
                .map(|record| deep_read(record, child_name).cloned().unwrap_or(Value::Null))
                .collect();
            template.set(Some(Value::Array(column)));
            template.pre_render()
        });
        join_all(tasks).await.into_iter().collect()
    }
}

impl Field {
    /// The records of a list field; empty for other kinds or before a value
    /// is set.
    pub fn records(&self) -> &[Value] {
        match (&self.kind, &self.value) {
            (FieldKind::List(_), Value::Array(records)) => records,
            _ => &[],
        }
    }
}
