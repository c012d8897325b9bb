//! Widget system for rendering HTML form elements.
//!
//! Widgets are the bridge between fields and their HTML representation. A
//! widget renders a control for a given `name` and current JSON value,
//! generates the `id` its `<label>` points at, and may load data it needs
//! before rendering (see [`Widget::pre_render`]). Composite list fields
//! render through [`Widget::render_list`], which receives a [`ListItems`]
//! view that renders the hidden template and each item.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use formwork_core::utils::text::escape_html;
use formwork_core::FormworkResult;
use serde_json::Value;

/// HTML attributes rendered on a widget, kept sorted for deterministic output.
pub type Attrs = BTreeMap<String, String>;

/// A `(value, display label)` pair offered by a choice widget.
pub type Choice = (String, String);

/// Enumerates all built-in widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="hidden">`.
    HiddenInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<input type="date">`.
    DateInput,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// `<select>` whose options are loaded before rendering.
    RefSelect,
    /// `<input type="file">` with the current file and a clear checkbox.
    FileInput,
    /// A file input with an image preview.
    PictureInput,
    /// A coordinate input paired with an address input.
    MapInput,
    /// Plain text, not editable.
    Readonly,
    /// The container of a composite list field.
    List,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::HiddenInput => "HiddenInput",
            Self::Textarea => "Textarea",
            Self::CheckboxInput => "CheckboxInput",
            Self::DateInput => "DateInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::RefSelect => "RefSelect",
            Self::FileInput => "FileInput",
            Self::PictureInput => "PictureInput",
            Self::MapInput => "MapInput",
            Self::Readonly => "Readonly",
            Self::List => "List",
        };
        write!(f, "{name}")
    }
}

/// The items of a composite list field, as seen by its widget.
pub trait ListItems {
    /// Number of items currently held.
    fn item_count(&self) -> usize;

    /// Renders the blank template used to add new items client-side.
    fn render_template(&self) -> String;

    /// Renders the item at `index`.
    fn render_item(&self, index: usize) -> String;
}

/// A trait for HTML form widgets.
///
/// All widgets must be `Send + Sync` so fields holding them can be cleaned
/// and pre-rendered concurrently.
#[async_trait]
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget as an HTML string.
    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String;

    /// Renders a composite list field: its template followed by its items.
    fn render_list(&self, _name: &str, items: &dyn ListItems, _attrs: &Attrs) -> String {
        let mut html = items.render_template();
        for index in 0..items.item_count() {
            html.push_str(&items.render_item(index));
        }
        html
    }

    /// Loads whatever the widget needs before rendering.
    async fn pre_render(&self, _name: &str, _value: &Value) -> FormworkResult<()> {
        Ok(())
    }

    /// Returns the HTML `id` attribute of the control named `name`.
    fn id_for_label(&self, name: &str) -> String {
        format!("id_{name}")
    }
}

/// Formats an attributes map into a string like ` key="value" key2="value2"`.
fn render_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect()
}

/// Formats a JSON value the way it appears inside a control.
///
/// Null renders as the empty string, strings render bare, everything else
/// renders as JSON text.
///
/// # Examples
///
/// ```
/// use formwork_forms::widgets::display_value;
/// use serde_json::json;
///
/// assert_eq!(display_value(&json!(null)), "");
/// assert_eq!(display_value(&json!("abc")), "abc");
/// assert_eq!(display_value(&json!(3)), "3");
/// ```
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "on" | "true" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn render_input(input_type: &str, name: &str, value: &Value, attrs: &Attrs) -> String {
    let value_attr = if value.is_null() {
        String::new()
    } else {
        format!(r#" value="{}""#, escape_html(&display_value(value)))
    };
    format!(
        r#"<input type="{input_type}" name="{name}" id="id_{name}"{value_attr}{} />"#,
        render_attrs(attrs)
    )
}

fn render_options(choices: &[Choice], selected: &[String]) -> String {
    choices
        .iter()
        .map(|(val, label)| {
            let marker = if selected.iter().any(|s| s == val) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{}"{marker}>{}</option>"#,
                escape_html(val),
                escape_html(label)
            )
        })
        .collect()
}

fn selected_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(display_value).collect(),
        Value::Null => Vec::new(),
        other => vec![display_value(other)],
    }
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

/// A basic `<input type="text">` widget.
#[derive(Debug, Clone)]
pub struct TextInput;

impl Widget for TextInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::TextInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("text", name, value, attrs)
    }
}

/// An `<input type="number">` widget.
#[derive(Debug, Clone)]
pub struct NumberInput;

impl Widget for NumberInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::NumberInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("number", name, value, attrs)
    }
}

/// An `<input type="hidden">` widget.
#[derive(Debug, Clone)]
pub struct HiddenInput;

impl Widget for HiddenInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::HiddenInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("hidden", name, value, attrs)
    }
}

/// An `<input type="date">` widget.
#[derive(Debug, Clone)]
pub struct DateInput;

impl Widget for DateInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::DateInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("date", name, value, attrs)
    }
}

/// A `<textarea>` widget.
#[derive(Debug, Clone)]
pub struct Textarea;

impl Widget for Textarea {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Textarea
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        format!(
            r#"<textarea name="{name}" id="id_{name}"{}>{}</textarea>"#,
            render_attrs(attrs),
            escape_html(&display_value(value))
        )
    }
}

/// An `<input type="checkbox">` widget.
#[derive(Debug, Clone)]
pub struct CheckboxInput;

impl Widget for CheckboxInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let checked = if is_checked(value) { " checked" } else { "" };
        format!(
            r#"<input type="checkbox" name="{name}" id="id_{name}"{}{checked} />"#,
            render_attrs(attrs)
        )
    }
}

/// Plain-text display of a value that cannot be edited.
#[derive(Debug, Clone)]
pub struct ReadonlyDisplay;

impl Widget for ReadonlyDisplay {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Readonly
    }

    fn render(&self, name: &str, value: &Value, _attrs: &Attrs) -> String {
        format!(
            r#"<span class="nf_readonly" id="id_{name}">{}</span>"#,
            escape_html(&display_value(value))
        )
    }
}

/// A `<select>` widget.
#[derive(Debug, Clone)]
pub struct Select {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<Choice>,
}

impl Select {
    /// Creates a new `Select` widget with the given choices.
    pub const fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let options = render_options(&self.choices, &selected_values(value));
        format!(
            r#"<select name="{name}" id="id_{name}"{}><option value=""></option>{options}</select>"#,
            render_attrs(attrs)
        )
    }
}

/// A `<select multiple>` widget.
#[derive(Debug, Clone)]
pub struct SelectMultiple {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<Choice>,
}

impl SelectMultiple {
    /// Creates a new `SelectMultiple` widget with the given choices.
    pub const fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }
}

impl Widget for SelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::SelectMultiple
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let options = render_options(&self.choices, &selected_values(value));
        format!(
            r#"<select name="{name}" id="id_{name}" multiple{}>{options}</select>"#,
            render_attrs(attrs)
        )
    }
}

/// Loads the options offered by a reference field.
#[async_trait]
pub trait ChoiceLoader: Send + Sync + fmt::Debug {
    /// Returns up to `limit` choices from the `target` collection.
    async fn load_choices(&self, target: &str, limit: Option<usize>)
        -> FormworkResult<Vec<Choice>>;
}

/// A [`ChoiceLoader`] serving a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticChoices {
    /// The choices served for every target.
    pub choices: Vec<Choice>,
}

impl StaticChoices {
    /// Creates a loader serving the given choices.
    pub const fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }
}

#[async_trait]
impl ChoiceLoader for StaticChoices {
    async fn load_choices(
        &self,
        _target: &str,
        limit: Option<usize>,
    ) -> FormworkResult<Vec<Choice>> {
        let take = limit.unwrap_or(self.choices.len());
        Ok(self.choices.iter().take(take).cloned().collect())
    }
}

/// A `<select>` over objects of another collection.
///
/// Options are fetched through the [`ChoiceLoader`] during
/// [`pre_render`](Widget::pre_render) and kept for later renders.
#[derive(Debug, Default)]
pub struct RefSelect {
    target: String,
    limit: Option<usize>,
    loader: Option<Arc<dyn ChoiceLoader>>,
    options: RwLock<Vec<Choice>>,
}

impl RefSelect {
    /// Creates a reference select for the given collection.
    pub fn new(target: impl Into<String>, limit: Option<usize>) -> Self {
        Self {
            target: target.into(),
            limit,
            ..Self::default()
        }
    }

    /// Sets the loader used to fetch options.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn ChoiceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Returns the options loaded so far.
    pub fn options(&self) -> Vec<Choice> {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Widget for RefSelect {
    fn widget_type(&self) -> WidgetType {
        WidgetType::RefSelect
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let options = render_options(&self.options(), &selected_values(value));
        format!(
            r#"<select name="{name}" id="id_{name}"{}><option value=""></option>{options}</select>"#,
            render_attrs(attrs)
        )
    }

    async fn pre_render(&self, name: &str, _value: &Value) -> FormworkResult<()> {
        let Some(loader) = &self.loader else {
            return Ok(());
        };
        let loaded = loader.load_choices(&self.target, self.limit).await?;
        tracing::debug!(field = name, target = %self.target, count = loaded.len(), "loaded reference options");
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        Ok(())
    }
}

fn render_clear(name: &str) -> String {
    format!(
        r#"<label class="nf_clear"><input type="checkbox" name="{name}_clear" /> Clear</label>"#
    )
}

/// A file input showing the currently stored file and a clear checkbox.
#[derive(Debug, Clone)]
pub struct FileInput;

impl Widget for FileInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::FileInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let mut html = String::new();
        if let Some(url) = value.get("url").and_then(Value::as_str) {
            let label = value.get("path").and_then(Value::as_str).unwrap_or(url);
            html.push_str(&format!(
                r#"<a class="nf_current" href="{}">{}</a>"#,
                escape_html(url),
                escape_html(label)
            ));
            html.push_str(&render_clear(name));
        }
        html.push_str(&render_input("file", name, &Value::Null, attrs));
        html
    }
}

/// A file input with a preview of the current picture.
#[derive(Debug, Clone)]
pub struct PictureInput;

impl Widget for PictureInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::PictureInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let mut html = String::new();
        if let Some(url) = value.get("url").and_then(Value::as_str) {
            html.push_str(&format!(
                r#"<img class="nf_preview" src="{}" alt="" />"#,
                escape_html(url)
            ));
            html.push_str(&render_clear(name));
        }
        let mut file_attrs = attrs.clone();
        file_attrs
            .entry("accept".to_string())
            .or_insert_with(|| "image/*".to_string());
        html.push_str(&render_input("file", name, &Value::Null, &file_attrs));
        html
    }
}

/// A `"lat,lng"` coordinate input paired with an `<name>_address` input.
#[derive(Debug, Clone)]
pub struct MapInput;

impl Widget for MapInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::MapInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let coordinates = value
            .get("geometry")
            .and_then(|g| Some(format!("{},{}", g.get("lat")?, g.get("lng")?)))
            .map_or(Value::Null, Value::String);
        let address = value.get("address").cloned().unwrap_or(Value::Null);
        format!(
            r#"<div class="nf_map">{}{}</div>"#,
            render_input("text", name, &coordinates, attrs),
            render_input("text", &format!("{name}_address"), &address, &Attrs::new())
        )
    }
}

/// The container of a composite list field.
///
/// Renders a hidden template block followed by one `<li>` per item.
#[derive(Debug, Clone)]
pub struct ListWidget;

impl Widget for ListWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::List
    }

    fn render(&self, _name: &str, _value: &Value, _attrs: &Attrs) -> String {
        String::new()
    }

    fn render_list(&self, name: &str, items: &dyn ListItems, attrs: &Attrs) -> String {
        let mut html = format!(
            r#"<div class="nf_listfield" id="id_{name}"{}><div class="nf_hidden_template">"#,
            render_attrs(attrs)
        );
        html.push_str(&items.render_template());
        html.push_str("</div><ul>");
        for index in 0..items.item_count() {
            html.push_str(r#"<li class="nf_listfield_item">"#);
            html.push_str(&items.render_item(index));
            html.push_str("</li>");
        }
        html.push_str("</ul></div>");
        html
    }
}

/// Creates a shared widget from a `WidgetType`, populating choices if
/// applicable.
///
/// A `RefSelect` created this way has no target collection or loader.
pub fn create_widget(widget_type: WidgetType, choices: &[Choice]) -> Arc<dyn Widget> {
    match widget_type {
        WidgetType::TextInput => Arc::new(TextInput),
        WidgetType::NumberInput => Arc::new(NumberInput),
        WidgetType::HiddenInput => Arc::new(HiddenInput),
        WidgetType::Textarea => Arc::new(Textarea),
        WidgetType::CheckboxInput => Arc::new(CheckboxInput),
        WidgetType::DateInput => Arc::new(DateInput),
        WidgetType::Select => Arc::new(Select::new(choices.to_vec())),
        WidgetType::SelectMultiple => Arc::new(SelectMultiple::new(choices.to_vec())),
        WidgetType::RefSelect => Arc::new(RefSelect::default()),
        WidgetType::FileInput => Arc::new(FileInput),
        WidgetType::PictureInput => Arc::new(PictureInput),
        WidgetType::MapInput => Arc::new(MapInput),
        WidgetType::Readonly => Arc::new(ReadonlyDisplay),
        WidgetType::List => Arc::new(ListWidget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, &str)]) -> Attrs {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_text_input_render() {
        let html = TextInput.render("title", &json!("Hello"), &Attrs::new());
        assert_eq!(
            html,
            r#"<input type="text" name="title" id="id_title" value="Hello" />"#
        );
    }

    #[test]
    fn test_text_input_escapes_value() {
        let html = TextInput.render("q", &json!(r#"<b>"x"</b>"#), &Attrs::new());
        assert!(html.contains(r#"value="&lt;b&gt;&quot;x&quot;&lt;/b&gt;""#));
    }

    #[test]
    fn test_null_value_omits_value_attr() {
        let html = NumberInput.render("qty", &Value::Null, &attrs(&[("min", "0")]));
        assert_eq!(
            html,
            r#"<input type="number" name="qty" id="id_qty" min="0" />"#
        );
    }

    #[test]
    fn test_attrs_sorted() {
        let html = TextInput.render("a", &Value::Null, &attrs(&[("z", "1"), ("b", "2")]));
        assert!(html.contains(r#" b="2" z="1""#));
    }

    #[test]
    fn test_checkbox_checked() {
        assert!(CheckboxInput
            .render("ok", &json!(true), &Attrs::new())
            .contains(" checked"));
        assert!(!CheckboxInput
            .render("ok", &json!(false), &Attrs::new())
            .contains(" checked"));
        assert!(CheckboxInput
            .render("ok", &json!("on"), &Attrs::new())
            .contains(" checked"));
    }

    #[test]
    fn test_select_marks_selected() {
        let select = Select::new(vec![("a".into(), "A".into()), ("b".into(), "B".into())]);
        let html = select.render("letter", &json!("b"), &Attrs::new());
        assert!(html.contains(r#"<option value="b" selected>B</option>"#));
        assert!(html.contains(r#"<option value="a">A</option>"#));
    }

    #[test]
    fn test_select_multiple_marks_all_selected() {
        let select = SelectMultiple::new(vec![
            ("a".into(), "A".into()),
            ("b".into(), "B".into()),
            ("c".into(), "C".into()),
        ]);
        let html = select.render("tags", &json!(["a", "c"]), &Attrs::new());
        assert!(html.contains(" multiple"));
        assert!(html.contains(r#"<option value="a" selected>"#));
        assert!(html.contains(r#"<option value="b">"#));
        assert!(html.contains(r#"<option value="c" selected>"#));
    }

    #[tokio::test]
    async fn test_ref_select_loads_options() {
        let loader = Arc::new(StaticChoices::new(vec![
            ("1".into(), "One".into()),
            ("2".into(), "Two".into()),
            ("3".into(), "Three".into()),
        ]));
        let widget = RefSelect::new("authors", Some(2)).with_loader(loader);
        assert!(widget.options().is_empty());

        widget.pre_render("author", &Value::Null).await.unwrap();
        assert_eq!(widget.options().len(), 2);
        let html = widget.render("author", &json!("2"), &Attrs::new());
        assert!(html.contains(r#"<option value="2" selected>Two</option>"#));
        assert!(!html.contains("Three"));
    }

    #[test]
    fn test_file_input_shows_current_file() {
        let value = json!({"path": "a_1.txt", "url": "/cdn/a_1.txt", "size": 3});
        let html = FileInput.render("doc", &value, &Attrs::new());
        assert!(html.contains(r#"<a class="nf_current" href="/cdn/a_1.txt">a_1.txt</a>"#));
        assert!(html.contains(r#"name="doc_clear""#));
        assert!(html.ends_with(r#"<input type="file" name="doc" id="id_doc" />"#));
    }

    #[test]
    fn test_file_input_without_value() {
        let html = FileInput.render("doc", &Value::Null, &Attrs::new());
        assert!(!html.contains("doc_clear"));
    }

    #[test]
    fn test_picture_input_preview() {
        let html = PictureInput.render("photo", &json!({"url": "/cdn/p.png"}), &Attrs::new());
        assert!(html.contains(r#"<img class="nf_preview" src="/cdn/p.png" alt="" />"#));
        assert!(html.contains(r#"accept="image/*""#));
    }

    #[test]
    fn test_map_input() {
        let value = json!({"geometry": {"lat": 59.9, "lng": 10.7}, "address": "Oslo"});
        let html = MapInput.render("location", &value, &Attrs::new());
        assert!(html.contains(r#"name="location" id="id_location" value="59.9,10.7""#));
        assert!(html.contains(r#"name="location_address" id="id_location_address" value="Oslo""#));
    }

    struct Items(Vec<&'static str>);

    impl ListItems for Items {
        fn item_count(&self) -> usize {
            self.0.len()
        }

        fn render_template(&self) -> String {
            "T".to_string()
        }

        fn render_item(&self, index: usize) -> String {
            self.0[index].to_string()
        }
    }

    #[test]
    fn test_list_widget_layout() {
        let html = ListWidget.render_list("items", &Items(vec!["a", "b"]), &Attrs::new());
        assert_eq!(
            html,
            concat!(
                r#"<div class="nf_listfield" id="id_items"><div class="nf_hidden_template">T</div>"#,
                r#"<ul><li class="nf_listfield_item">a</li><li class="nf_listfield_item">b</li></ul></div>"#
            )
        );
    }

    #[test]
    fn test_default_render_list_concatenates() {
        assert_eq!(TextInput.render_list("x", &Items(vec!["a"]), &Attrs::new()), "Ta");
    }

    #[test]
    fn test_create_widget() {
        assert_eq!(
            create_widget(WidgetType::Textarea, &[]).widget_type(),
            WidgetType::Textarea
        );
        assert_eq!(create_widget(WidgetType::List, &[]).widget_type().to_string(), "List");
        assert_eq!(TextInput.id_for_label("items_li0_qty"), "id_items_li0_qty");
    }
}
