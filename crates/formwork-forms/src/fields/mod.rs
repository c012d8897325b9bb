//! Field definitions and the per-field validation lifecycle.
//!
//! A [`Field`] couples a [`FieldKind`] (the closed set of variants: strings,
//! numbers, choices, uploads, composite lists, ...) with the state every
//! field carries: its bound `name`, current `value`, `default`, `required`
//! flag, validator chain, accumulated `errors`, and the widget it renders
//! with.
//!
//! The lifecycle of a field during one request is:
//!
//! 1. [`Field::set`] stores the raw input, falling back to the default.
//! 2. [`Field::clean_value`] coerces the value for its kind, applies the
//!    required check and runs the validators, recording failures in `errors`.
//!    Cleaning never returns an error: inspecting `errors` is how a caller
//!    learns the outcome.
//! 3. [`Field::pre_render`] lets the widget load what it needs.
//! 4. [`Field::render`] / [`Field::render_with_label`] write HTML.

mod coerce;
mod upload;

use std::fmt;
use std::sync::Arc;

use formwork_core::logging::clean_span;
use formwork_core::utils::text::{escape_html, humanize_name};
use formwork_core::{FormworkError, FormworkResult};
use formwork_http::FormRequest;
use futures::future::{self, BoxFuture};
use serde_json::Value;
use tracing::Instrument;

use crate::list::ListField;
use crate::schema::{SchemaFragment, SchemaType};
use crate::storage::UploadProvider;
use crate::validators::Validator;
use crate::widgets::{create_widget, Attrs, Choice, ChoiceLoader, RefSelect, Widget, WidgetType};

use upload::Descriptor;

/// The message recorded when a required field has no value.
pub const REQUIRED_MESSAGE: &str = "this field is required";

/// The variant of a field, including variant-specific parameters.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Free text.
    String,
    /// A value shown but never edited; rendered without a label.
    Readonly,
    /// A checkbox; true iff the body carries a non-empty value for the name.
    Boolean,
    /// A number, kept integral when the input is integral.
    Number {
        /// Minimum allowed value.
        min: Option<f64>,
        /// Maximum allowed value.
        max: Option<f64>,
        /// Step hint for the widget.
        step: Option<f64>,
    },
    /// A calendar date stored as `YYYY-MM-DD`.
    Date,
    /// One value out of a fixed set.
    Enum {
        /// The allowed `(value, label)` pairs.
        choices: Vec<Choice>,
    },
    /// Any number of values out of a fixed set.
    EnumMulti {
        /// The allowed `(value, label)` pairs.
        choices: Vec<Choice>,
    },
    /// A reference to an object of another collection.
    Reference {
        /// The referenced collection.
        target: String,
        /// How many options the widget loads.
        limit: Option<usize>,
    },
    /// A `"lat,lng"` location with an optional address.
    Geo,
    /// Arbitrary JSON entered as text.
    Dict,
    /// An uploaded file.
    File {
        /// Where uploads are stored.
        storage: Arc<dyn UploadProvider>,
    },
    /// An uploaded picture.
    Picture {
        /// Where uploads are stored.
        storage: Arc<dyn UploadProvider>,
    },
    /// A variable-length sequence of records.
    List(ListField),
}

impl FieldKind {
    fn default_widget(&self) -> Arc<dyn Widget> {
        match self {
            Self::String => create_widget(WidgetType::TextInput, &[]),
            Self::Readonly => create_widget(WidgetType::HiddenInput, &[]),
            Self::Boolean => create_widget(WidgetType::CheckboxInput, &[]),
            Self::Number { .. } => create_widget(WidgetType::NumberInput, &[]),
            Self::Date => create_widget(WidgetType::DateInput, &[]),
            Self::Enum { choices } => create_widget(WidgetType::Select, choices),
            Self::EnumMulti { choices } => create_widget(WidgetType::SelectMultiple, choices),
            Self::Reference { target, limit } => Arc::new(RefSelect::new(target.clone(), *limit)),
            Self::Geo => create_widget(WidgetType::MapInput, &[]),
            Self::Dict => create_widget(WidgetType::Textarea, &[]),
            Self::File { .. } => create_widget(WidgetType::FileInput, &[]),
            Self::Picture { .. } => create_widget(WidgetType::PictureInput, &[]),
            Self::List(_) => create_widget(WidgetType::List, &[]),
        }
    }

    fn check(&self) -> FormworkResult<()> {
        match self {
            Self::Reference { target, .. } if target.trim().is_empty() => Err(
                FormworkError::ImproperlyConfigured("reference field requires a target collection".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// A single field: configuration plus per-request state.
///
/// # Examples
///
/// ```
/// use formwork_forms::fields::Field;
/// use serde_json::json;
///
/// let mut title = Field::string().required(true).bind("title");
/// title.set(Some(json!("Hello")));
/// assert_eq!(title.value, json!("Hello"));
/// assert_eq!(title.get_label(), "Title");
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    /// The bound name; also the key in the request body.
    pub name: String,
    /// The variant.
    pub kind: FieldKind,
    /// The current value.
    pub value: Value,
    /// The value used when none is supplied.
    pub default: Option<Value>,
    /// Whether a non-empty value is mandatory.
    pub required: bool,
    /// An explicit label; defaults to the humanized name.
    pub label: Option<String>,
    /// Extra HTML attributes for the widget.
    pub attrs: Attrs,
    /// Messages recorded by the last clean.
    pub errors: Vec<String>,
    validators: Vec<Arc<dyn Validator>>,
    widget: Arc<dyn Widget>,
}

impl Field {
    /// Creates an unbound field of the given kind with its default widget.
    ///
    /// Fails with [`FormworkError::ImproperlyConfigured`] when the kind is
    /// declared inconsistently (e.g. a reference without a target).
    pub fn new(kind: FieldKind) -> FormworkResult<Self> {
        kind.check()?;
        Ok(Self::from_kind(kind))
    }

    fn from_kind(kind: FieldKind) -> Self {
        let required = matches!(kind, FieldKind::Enum { .. });
        let default = match kind {
            FieldKind::List(_) => Some(Value::Array(Vec::new())),
            _ => None,
        };
        Self {
            name: String::new(),
            widget: kind.default_widget(),
            kind,
            value: Value::Null,
            default,
            required,
            label: None,
            attrs: Attrs::new(),
            errors: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// A free-text field.
    pub fn string() -> Self {
        Self::from_kind(FieldKind::String)
    }

    /// A read-only field rendered as a hidden input.
    pub fn readonly() -> Self {
        Self::from_kind(FieldKind::Readonly)
    }

    /// A checkbox field.
    pub fn boolean() -> Self {
        Self::from_kind(FieldKind::Boolean)
    }

    /// An unbounded number field.
    pub fn number() -> Self {
        Self::from_kind(FieldKind::Number {
            min: None,
            max: None,
            step: None,
        })
    }

    /// A number field restricted to `[min, max]`.
    pub fn number_between(min: Option<f64>, max: Option<f64>) -> Self {
        Self::from_kind(FieldKind::Number {
            min,
            max,
            step: None,
        })
    }

    /// A date field.
    pub fn date() -> Self {
        Self::from_kind(FieldKind::Date)
    }

    /// A single-choice field. Enumerations are always required.
    pub fn enumeration(choices: Vec<Choice>) -> Self {
        Self::from_kind(FieldKind::Enum { choices })
    }

    /// A multiple-choice field.
    pub fn enum_multi(choices: Vec<Choice>) -> Self {
        Self::from_kind(FieldKind::EnumMulti { choices })
    }

    /// A reference to an object of the `target` collection.
    pub fn reference(target: impl Into<String>, limit: Option<usize>) -> FormworkResult<Self> {
        Self::new(FieldKind::Reference {
            target: target.into(),
            limit,
        })
    }

    /// A location field.
    pub fn geo() -> Self {
        Self::from_kind(FieldKind::Geo)
    }

    /// A free-form JSON field.
    pub fn dict() -> Self {
        Self::from_kind(FieldKind::Dict)
    }

    /// A file upload field storing through `storage`.
    pub fn file(storage: Arc<dyn UploadProvider>) -> Self {
        Self::from_kind(FieldKind::File { storage })
    }

    /// A picture upload field storing through `storage`.
    pub fn picture(storage: Arc<dyn UploadProvider>) -> Self {
        Self::from_kind(FieldKind::Picture { storage })
    }

    /// A composite list field. Its default value is the empty list.
    pub fn list(list: ListField) -> Self {
        Self::from_kind(FieldKind::List(list))
    }

    /// Sets whether the field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets an explicit label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds an HTML attribute to the widget.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Appends a validator to the chain.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Replaces the widget.
    #[must_use]
    pub fn with_widget(mut self, widget: Arc<dyn Widget>) -> Self {
        self.widget = widget;
        self
    }

    /// Replaces the widget by a built-in one, keeping the field's choices.
    #[must_use]
    pub fn with_widget_type(mut self, widget_type: WidgetType) -> Self {
        let choices = match &self.kind {
            FieldKind::Enum { choices } | FieldKind::EnumMulti { choices } => choices.as_slice(),
            _ => &[],
        };
        self.widget = create_widget(widget_type, choices);
        self
    }

    /// Sets the loader a reference field fetches its options with.
    ///
    /// Has no effect on other kinds.
    #[must_use]
    pub fn with_choice_loader(mut self, loader: Arc<dyn ChoiceLoader>) -> Self {
        if let FieldKind::Reference { target, limit } = &self.kind {
            self.widget = Arc::new(RefSelect::new(target.clone(), *limit).with_loader(loader));
        }
        self
    }

    /// Returns a fresh copy of this field bound to `name`.
    ///
    /// The copy starts from the default value with no errors, so one
    /// declared field can serve as the template for many bound instances.
    #[must_use]
    pub fn bind(&self, name: impl Into<String>) -> Self {
        let mut bound = self.clone();
        bound.name = name.into();
        bound.errors.clear();
        bound.value = bound.default.clone().unwrap_or(Value::Null);
        if let FieldKind::List(list) = &mut bound.kind {
            list.reset_children_errors();
        }
        bound
    }

    /// Returns the widget.
    pub fn widget(&self) -> &Arc<dyn Widget> {
        &self.widget
    }

    /// Returns the validator chain.
    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    /// Returns the composite part of a list field.
    pub const fn as_list(&self) -> Option<&ListField> {
        match &self.kind {
            FieldKind::List(list) => Some(list),
            _ => None,
        }
    }

    /// Returns true when the last clean recorded no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Stores `value`, or the default when `value` is absent or null.
    pub fn set(&mut self, value: Option<Value>) {
        self.value = match value {
            None | Some(Value::Null) => self.default.clone().unwrap_or(Value::Null),
            Some(value) => value,
        };
    }

    /// Validates the current value, recording failures in `errors`.
    ///
    /// Variants with side effects (uploads) or children (lists) suspend;
    /// the returned future always completes. Errors from a previous clean are
    /// discarded first, so cleaning is repeatable.
    pub fn clean_value<'a>(&'a mut self, request: &'a FormRequest) -> BoxFuture<'a, ()> {
        let span = clean_span(&self.name);
        Box::pin(
            async move {
                self.errors.clear();
                match &self.kind {
                    FieldKind::List(_) => {
                        crate::list::clean::clean_list(self, request).await;
                        return;
                    }
                    FieldKind::Boolean => {
                        self.value = Value::Bool(coerce::checkbox(request.body.get(&self.name)));
                    }
                    FieldKind::Number { min, max, .. } => {
                        coerce::number(&mut self.value, &mut self.errors, *min, *max);
                    }
                    FieldKind::Date => coerce::date(&mut self.value, &mut self.errors),
                    FieldKind::Enum { choices } => {
                        coerce::choice(&mut self.value, &mut self.errors, choices);
                    }
                    FieldKind::EnumMulti { choices } => {
                        coerce::choice_multi(&mut self.value, &mut self.errors, choices);
                    }
                    FieldKind::Geo => {
                        let address = request.body.get(&format!("{}_address", self.name));
                        coerce::geo(&mut self.value, address);
                    }
                    FieldKind::Dict => coerce::dict(&mut self.value, &mut self.errors),
                    FieldKind::File { storage } => {
                        let storage = Arc::clone(storage);
                        upload::clean_upload(self, storage.as_ref(), request, Descriptor::File)
                            .await;
                    }
                    FieldKind::Picture { storage } => {
                        let storage = Arc::clone(storage);
                        upload::clean_upload(self, storage.as_ref(), request, Descriptor::Picture)
                            .await;
                    }
                    FieldKind::String | FieldKind::Readonly | FieldKind::Reference { .. } => {}
                }
                self.run_base_checks();
            }
            .instrument(span),
        )
    }

    /// Applies the checks shared by every variant: empty-string
    /// normalization, the required check, and the validator chain.
    ///
    /// The required check is skipped when coercion already reported the
    /// value as invalid.
    pub(crate) fn run_base_checks(&mut self) {
        coerce::empty_to_null(&mut self.value);
        if self.required && self.errors.is_empty() && coerce::is_blank(&self.value) {
            self.errors.push(REQUIRED_MESSAGE.to_string());
        }
        for validator in &self.validators {
            if let Err(e) = validator.validate(&self.value) {
                tracing::debug!(field = %self.name, validator = validator.name(), "validator rejected value");
                self.errors.push(e.message);
            }
        }
    }

    /// Lets the widget, and the children of a list field, load what they
    /// need before rendering.
    pub fn pre_render(&mut self) -> BoxFuture<'_, FormworkResult<()>> {
        Box::pin(async move {
            let Self {
                name,
                kind,
                value,
                widget,
                ..
            } = self;
            match kind {
                FieldKind::List(list) => {
                    let (children, own) =
                        future::join(list.pre_render_children(value), widget.pre_render(name, value))
                            .await;
                    children.and(own)
                }
                _ => widget.pre_render(name, value).await,
            }
        })
    }

    /// Returns the display label: the explicit label or the name, with each
    /// underscore-separated word capitalized.
    pub fn get_label(&self) -> String {
        humanize_name(self.label.as_deref().unwrap_or(&self.name))
    }

    fn widget_attrs(&self) -> Attrs {
        let mut attrs = self.attrs.clone();
        if self.required {
            attrs
                .entry("required".to_string())
                .or_insert_with(|| "required".to_string());
        }
        if let FieldKind::Number { min, max, step } = &self.kind {
            for (key, bound) in [("min", min), ("max", max), ("step", step)] {
                if let Some(bound) = bound {
                    attrs
                        .entry(key.to_string())
                        .or_insert_with(|| bound.to_string());
                }
            }
        }
        attrs
    }

    /// Renders the widget.
    pub fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let attrs = self.widget_attrs();
        let html = match &self.kind {
            FieldKind::List(list) => list.render_items(&self.name, &self.value, self.widget.as_ref(), &attrs),
            FieldKind::Dict => {
                let text = match &self.value {
                    Value::Null | Value::String(_) => self.value.clone(),
                    other => Value::String(other.to_string()),
                };
                self.widget.render(&self.name, &text, &attrs)
            }
            _ => self.widget.render(&self.name, &self.value, &attrs),
        };
        out.write_str(&html)
    }

    /// Renders the `<label>` pointing at the widget. Read-only fields have
    /// no label.
    pub fn render_label(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if matches!(self.kind, FieldKind::Readonly) {
            return Ok(());
        }
        write!(
            out,
            r#"<label class="field_label" for="{}">{}</label>"#,
            self.widget.id_for_label(&self.name),
            escape_html(&self.get_label())
        )
    }

    /// Renders one `<span class="error">` per recorded error.
    pub fn render_error(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for error in &self.errors {
            write!(out, r#"<span class="error">{}</span>"#, escape_html(error))?;
        }
        Ok(())
    }

    /// Renders label, widget and errors wrapped in `<div class="field">`.
    /// Read-only fields render the widget alone.
    pub fn render_with_label(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if matches!(self.kind, FieldKind::Readonly) {
            return self.render(out);
        }
        out.write_str(r#"<div class="field">"#)?;
        self.render_label(out)?;
        self.render(out)?;
        self.render_error(out)?;
        out.write_str("</div>")
    }

    /// [`render`](Self::render) into a string.
    pub fn render_str(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render(&mut out);
        out
    }

    /// [`render_with_label`](Self::render_with_label) into a string.
    pub fn render_with_label_str(&self) -> String {
        let mut out = String::new();
        let _ = self.render_with_label(&mut out);
        out
    }

    /// [`render_label`](Self::render_label) into a string.
    pub fn render_label_str(&self) -> String {
        let mut out = String::new();
        let _ = self.render_label(&mut out);
        out
    }

    /// [`render_error`](Self::render_error) into a string.
    pub fn render_error_str(&self) -> String {
        let mut out = String::new();
        let _ = self.render_error(&mut out);
        out
    }

    /// Describes the persisted shape of this field's value.
    pub fn to_schema(&self) -> SchemaFragment {
        let base = |kind| {
            SchemaFragment::new(kind)
                .required(self.required)
                .default_value(self.default.clone())
        };
        let values = |choices: &[Choice]| choices.iter().map(|(v, _)| v.clone()).collect();
        match &self.kind {
            FieldKind::String => base(SchemaType::String),
            FieldKind::Readonly | FieldKind::Dict => base(SchemaType::Mixed),
            FieldKind::Boolean => base(SchemaType::Boolean),
            FieldKind::Number { .. } => base(SchemaType::Number),
            FieldKind::Date => base(SchemaType::Date),
            FieldKind::Enum { choices } => base(SchemaType::String).choices(values(choices)),
            FieldKind::EnumMulti { choices } => SchemaFragment::array_of(
                SchemaFragment::new(SchemaType::String).choices(values(choices)),
            )
            .required(self.required)
            .default_value(self.default.clone()),
            FieldKind::Reference { target, .. } => base(SchemaType::ObjectId).reference(target.clone()),
            FieldKind::Geo => base(SchemaType::Object)
                .field(
                    "geometry",
                    SchemaFragment::new(SchemaType::Object)
                        .field("lat", SchemaFragment::new(SchemaType::Number))
                        .field("lng", SchemaFragment::new(SchemaType::Number)),
                )
                .field("address", SchemaFragment::new(SchemaType::String)),
            FieldKind::File { .. } => base(SchemaType::Object)
                .field("path", SchemaFragment::new(SchemaType::String))
                .field("url", SchemaFragment::new(SchemaType::String))
                .field("size", SchemaFragment::new(SchemaType::Number)),
            FieldKind::Picture { .. } => base(SchemaType::Object)
                .field("url", SchemaFragment::new(SchemaType::String))
                .field("path", SchemaFragment::new(SchemaType::String))
                .field("size", SchemaFragment::new(SchemaType::Number))
                .field("original_name", SchemaFragment::new(SchemaType::String))
                .field("original_size", SchemaFragment::new(SchemaType::Number)),
            FieldKind::List(list) => list
                .to_schema()
                .required(self.required)
                .default_value(self.default.clone()),
        }
    }
}
