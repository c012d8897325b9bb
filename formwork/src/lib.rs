//! # formwork
//!
//! A server-rendered form engine: typed fields, HTML widgets, document forms
//! and composite list fields whose records travel through a flat form
//! payload.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `formwork` to get the whole engine, or on individual
//! crates for finer-grained control.

/// Core types, settings, logging, and error types.
pub use formwork_core as core;

/// Request payloads: ordered body data and temporary upload handles.
pub use formwork_http as http;

/// Fields, widgets, list fields, and document forms.
#[cfg(feature = "forms")]
pub use formwork_forms as forms;

/// Re-exported third-party crates so applications share one version.
pub use async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The most commonly used types.
///
/// ```
/// use formwork::prelude::*;
///
/// let items = ListField::new([("qty", Field::number())]).unwrap();
/// let field = Field::list(items).bind("items");
/// assert!(field.as_list().is_some());
/// ```
pub mod prelude {
    pub use formwork_core::{FormworkError, FormworkResult, Settings, ValidationError};
    pub use formwork_http::{FormRequest, QueryDict, TempFile};

    #[cfg(feature = "forms")]
    pub use formwork_forms::{
        DocumentForm, Field, FieldKind, Fieldset, Form, ListField, UploadProvider, Widget,
        WidgetType, SELF_FIELD,
    };
}
