//! Render grouping of fields.
//!
//! A [`Fieldset`] lists field names, and possibly nested fieldsets, in the
//! order they should be rendered. Titled fieldsets are wrapped in a
//! `<div class="nf_fieldset">` with an `<h2>` heading. Fieldsets only affect
//! rendering; cleaning always covers every declared field.

use std::fmt;

use formwork_core::utils::text::escape_html;

/// One entry of a fieldset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldsetEntry {
    /// A field, by its declared name.
    Field(String),
    /// A nested group.
    Fieldset(Fieldset),
}

/// An ordered, optionally titled group of fields.
///
/// # Examples
///
/// ```
/// use formwork_forms::fieldset::Fieldset;
///
/// let layout = Fieldset::new("Shipping")
///     .field("street")
///     .fieldset(Fieldset::untitled().field("zip").field("city"));
/// assert_eq!(layout.field_names(), vec!["street", "zip", "city"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fieldset {
    /// Heading shown above the group.
    pub title: Option<String>,
    /// The grouped entries, in render order.
    pub entries: Vec<FieldsetEntry>,
}

impl Fieldset {
    /// Creates an empty fieldset with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            entries: Vec::new(),
        }
    }

    /// Creates an empty fieldset without a title.
    pub fn untitled() -> Self {
        Self::default()
    }

    /// Appends a field by name.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.entries.push(FieldsetEntry::Field(name.into()));
        self
    }

    /// Appends a nested fieldset.
    #[must_use]
    pub fn fieldset(mut self, nested: Self) -> Self {
        self.entries.push(FieldsetEntry::Fieldset(nested));
        self
    }

    /// Returns every field name in the group, depth first.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        for entry in &self.entries {
            match entry {
                FieldsetEntry::Field(name) => names.push(name),
                FieldsetEntry::Fieldset(nested) => nested.collect_names(names),
            }
        }
    }

    fn render<F>(&self, out: &mut dyn fmt::Write, render_field: &mut F) -> fmt::Result
    where
        F: FnMut(&mut dyn fmt::Write, &str) -> fmt::Result,
    {
        let title = self.title.as_deref().filter(|t| !t.is_empty());
        if let Some(title) = title {
            write!(out, r#"<div class="nf_fieldset"><h2>{}</h2>"#, escape_html(title))?;
        }
        for entry in &self.entries {
            match entry {
                FieldsetEntry::Field(name) => render_field(out, name)?,
                FieldsetEntry::Fieldset(nested) => nested.render(out, render_field)?,
            }
        }
        if title.is_some() {
            out.write_str("</div>")?;
        }
        Ok(())
    }
}

/// Renders a set of fields following a layout.
///
/// With no fieldsets every name in `declared` is rendered in order. Otherwise
/// only the first fieldset is rendered.
pub(crate) fn render_layout<'a, F>(
    out: &mut dyn fmt::Write,
    fieldsets: &[Fieldset],
    declared: impl IntoIterator<Item = &'a str>,
    mut render_field: F,
) -> fmt::Result
where
    F: FnMut(&mut dyn fmt::Write, &str) -> fmt::Result,
{
    match fieldsets.first() {
        Some(layout) => layout.render(out, &mut render_field),
        None => declared
            .into_iter()
            .try_for_each(|name| render_field(&mut *out, name)),
    }
}
