//! Rendering of list fields: the hidden template plus one block per record.

use std::fmt;

use serde_json::Value;

use super::decode::{item_prefix, template_prefix};
use super::{ChildErrors, ListField, SELF_FIELD};
use crate::fieldset::render_layout;
use crate::path::deep_read;
use crate::widgets::{Attrs, ListItems, Widget};

struct ItemsView<'a> {
    name: &'a str,
    list: &'a ListField,
    records: &'a [Value],
}

impl ItemsView<'_> {
    fn record_html(&self, prefix: &str, index: Option<usize>) -> String {
        let record = index.and_then(|i| self.records.get(i));
        let errors = index.and_then(|i| self.list.children_errors.get(i));
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.list.render_record(&mut out, prefix, record, errors);
        out
    }
}

impl ListItems for ItemsView<'_> {
    fn item_count(&self) -> usize {
        self.records.len()
    }

    fn render_template(&self) -> String {
        self.record_html(&template_prefix(self.name), None)
    }

    fn render_item(&self, index: usize) -> String {
        self.record_html(&item_prefix(self.name, index), Some(index))
    }
}

impl ListField {
    pub(crate) fn render_items(
        &self,
        name: &str,
        value: &Value,
        widget: &dyn Widget,
        attrs: &Attrs,
    ) -> String {
        let records = value.as_array().map_or(&[][..], Vec::as_slice);
        let view = ItemsView {
            name,
            list: self,
            records,
        };
        widget.render_list(name, &view, attrs)
    }

    /// Renders the children of one record with every name prefixed by
    /// `prefix`.
    ///
    /// Without a record the children render their defaults, which is how the
    /// blank template is produced. The first fieldset, when declared, decides
    /// which children appear and how they are grouped.
    pub fn render_record(
        &self,
        out: &mut dyn fmt::Write,
        prefix: &str,
        record: Option<&Value>,
        errors: Option<&ChildErrors>,
    ) -> fmt::Result {
        render_layout(
            out,
            &self.fieldsets,
            self.fields.iter().map(|(name, _)| name.as_str()),
            |out, child_name| self.render_child(out, prefix, child_name, record, errors),
        )
    }

    fn render_child(
        &self,
        out: &mut dyn fmt::Write,
        prefix: &str,
        child_name: &str,
        record: Option<&Value>,
        errors: Option<&ChildErrors>,
    ) -> fmt::Result {
        let Some(template) = self.child(child_name) else {
            tracing::trace!(child = child_name, "fieldset names an undeclared child");
            return Ok(());
        };
        let mut child = template.bind(format!("{prefix}{child_name}"));
        if child.label.is_none() {
            child.label = Some(child_name.to_string());
        }
        child.errors = errors
            .and_then(|errors| errors.get(child_name))
            .cloned()
            .unwrap_or_default();

        if child_name == SELF_FIELD {
            child.set(record.cloned());
            child.render(out)
        } else {
            child.set(record.and_then(|r| deep_read(r, child_name)).cloned());
            child.render_with_label(out)
        }
    }
}
