//! The [`Form`] trait and the [`DocumentForm`] container.
//!
//! A [`DocumentForm`] owns an ordered set of named top-level fields. It binds
//! them from a request (falling back to a previously stored document),
//! cleans them concurrently, and exposes the outcome as per-field errors and
//! a nested cleaned document.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use formwork_core::{FormworkError, FormworkResult};
use formwork_http::FormRequest;
use futures::future::join_all;
use serde_json::{Map, Value};

use crate::fields::Field;
use crate::fieldset::{render_layout, Fieldset};
use crate::list::raw_input;
use crate::path::{deep_read, deep_write};
use crate::schema::{SchemaFragment, SchemaType};

/// The core form trait.
///
/// Cleaning is async because fields may suspend on upload providers and
/// composite children; all fields of a form are cleaned concurrently.
#[async_trait]
pub trait Form: Send + Sync {
    /// Returns the bound fields, in declaration order.
    fn fields(&self) -> &[Field];

    /// Sets every field from the request body, or from the stored document
    /// when the body has no value for it.
    fn bind(&mut self, request: &FormRequest);

    /// Returns `true` if this form has been bound to a request.
    fn is_bound(&self) -> bool;

    /// Cleans every field against `request`. Returns `true` if the form is
    /// bound and no field recorded an error.
    async fn clean(&mut self, request: &FormRequest) -> bool;

    /// Returns `true` if the form is bound and no field has errors.
    fn is_valid(&self) -> bool {
        self.is_bound() && self.fields().iter().all(Field::is_valid)
    }

    /// Returns the errors of every field that has any, keyed by name.
    fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.fields()
            .iter()
            .filter(|field| !field.errors.is_empty())
            .map(|field| (field.name.clone(), field.errors.clone()))
            .collect()
    }

    /// Returns the current field values as one document. Dotted field names
    /// become nested objects.
    fn cleaned_data(&self) -> Value {
        let mut document = Map::new();
        for field in self.fields() {
            deep_write(&mut document, &field.name, field.value.clone());
        }
        Value::Object(document)
    }
}

/// A form over one stored document.
///
/// # Examples
///
/// ```
/// use formwork_forms::{DocumentForm, Field};
/// use formwork_forms::form::Form;
/// use formwork_http::{FormRequest, QueryDict};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut form = DocumentForm::new([("title", Field::string().required(true))]).unwrap();
/// let request = FormRequest::new(QueryDict::parse("title=Hello"));
/// form.bind(&request);
/// assert!(form.clean(&request).await);
/// assert_eq!(form.cleaned_data()["title"], "Hello");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct DocumentForm {
    fields: Vec<Field>,
    fieldsets: Vec<Fieldset>,
    instance: Option<Value>,
    bound: bool,
}

impl DocumentForm {
    /// Declares a form from `(name, field)` pairs.
    ///
    /// Fails with [`FormworkError::ImproperlyConfigured`] when a name is
    /// empty or declared twice.
    pub fn new<N: Into<String>>(fields: impl IntoIterator<Item = (N, Field)>) -> FormworkResult<Self> {
        let mut declared: Vec<Field> = Vec::new();
        for (name, field) in fields {
            let name = name.into();
            if name.is_empty() {
                return Err(FormworkError::ImproperlyConfigured(
                    "form fields need a name".into(),
                ));
            }
            if declared.iter().any(|existing| existing.name == name) {
                return Err(FormworkError::ImproperlyConfigured(format!(
                    "form field {name} declared twice"
                )));
            }
            declared.push(field.bind(name));
        }
        Ok(Self {
            fields: declared,
            fieldsets: Vec::new(),
            instance: None,
            bound: false,
        })
    }

    /// Sets the fieldsets used when rendering.
    #[must_use]
    pub fn with_fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets = fieldsets;
        self
    }

    /// Loads a previously stored document. Every field takes its value from
    /// it, and binding falls back to it for values the request lacks.
    #[must_use]
    pub fn with_instance(mut self, document: Value) -> Self {
        for field in &mut self.fields {
            field.set(deep_read(&document, &field.name).cloned());
        }
        self.instance = Some(document);
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Looks up a field by name for modification.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    /// Runs every field's `pre_render` concurrently. The first failure is
    /// returned once all of them have finished.
    pub async fn pre_render(&mut self) -> FormworkResult<()> {
        join_all(self.fields.iter_mut().map(Field::pre_render))
            .await
            .into_iter()
            .collect()
    }

    /// Renders every field with its label, following the first fieldset
    /// when one is declared.
    pub fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        render_layout(
            out,
            &self.fieldsets,
            self.fields.iter().map(|field| field.name.as_str()),
            |out, name| self.field(name).map_or(Ok(()), |field| field.render_with_label(out)),
        )
    }

    /// [`render`](Self::render) into a string.
    pub fn render_str(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render(&mut out);
        out
    }

    /// Describes the stored document: an object of the field schemas nested
    /// by dotted name.
    pub fn to_schema(&self) -> SchemaFragment {
        let mut document = SchemaFragment::new(SchemaType::Object);
        for field in &self.fields {
            document.insert_path(&field.name, field.to_schema());
        }
        document
    }
}

#[async_trait]
impl Form for DocumentForm {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn bind(&mut self, request: &FormRequest) {
        for field in &mut self.fields {
            let stored = self
                .instance
                .as_ref()
                .and_then(|document| deep_read(document, &field.name));
            let input = raw_input(&request.body, &field.name).or_else(|| stored.cloned());
            field.set(input);
            field.errors.clear();
        }
        self.bound = true;
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    async fn clean(&mut self, request: &FormRequest) -> bool {
        if !self.bound {
            return false;
        }
        join_all(self.fields.iter_mut().map(|field| field.clean_value(request))).await;
        let invalid = self.fields.iter().filter(|field| !field.is_valid()).count();
        tracing::debug!(fields = self.fields.len(), invalid, "cleaned form");
        invalid == 0
    }
}
