//! # formwork-forms
//!
//! Fields, widgets, and forms for formwork. Provides the scalar field
//! variants, the composite [`ListField`](list::ListField) that handles
//! variable-length sequences of records submitted through a flat key-value
//! payload, and the [`DocumentForm`](form::DocumentForm) container that binds,
//! cleans, and renders a set of named fields.
//!
//! ## Modules
//!
//! - [`fields`] - The [`Field`](fields::Field) type and its variants
//! - [`list`] - The composite list field: payload decoding, cleaning, rendering
//! - [`widgets`] - HTML widgets and the [`Widget`](widgets::Widget) trait
//! - [`validators`] - Reusable value validators
//! - [`storage`] - Upload providers for file and picture fields
//! - [`schema`] - Schema fragments describing persisted field shapes
//! - [`fieldset`] - Render grouping of fields
//! - [`path`] - Dotted-path access into nested JSON records
//! - [`form`] - The [`DocumentForm`](form::DocumentForm) container

pub mod fields;
pub mod fieldset;
pub mod form;
pub mod list;
pub mod path;
pub mod schema;
pub mod storage;
pub mod validators;
pub mod widgets;

pub use fields::{Field, FieldKind};
pub use fieldset::{Fieldset, FieldsetEntry};
pub use form::{DocumentForm, Form};
pub use list::{ChildErrors, ListField, ListPayload, SELF_FIELD};
pub use schema::{SchemaFragment, SchemaType};
pub use storage::{FileSystemStorage, MemoryStorage, StoredFile, UploadError, UploadProvider};
pub use validators::Validator;
pub use widgets::{Widget, WidgetType};
