use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use formwork_forms::fields::REQUIRED_MESSAGE;
use formwork_forms::validators::MaxLengthValidator;
use formwork_forms::{
    ChildErrors, Field, Fieldset, ListField, StoredFile, UploadError, UploadProvider, SELF_FIELD,
};
use formwork_http::{FormRequest, QueryDict, TempFile};
use serde_json::{json, Map, Value};
use tokio::sync::Notify;

fn items_field() -> Field {
    let items = ListField::new([
        ("qty", Field::number().required(true)),
        ("note", Field::string()),
    ])
    .unwrap();
    Field::list(items).bind("items")
}

fn post(body: &str) -> FormRequest {
    FormRequest::new(QueryDict::parse(body))
}

fn children_errors(field: &Field) -> &[ChildErrors] {
    field.as_list().unwrap().children_errors()
}

#[tokio::test]
async fn test_mixed_valid_and_invalid_records() {
    let mut field = items_field();
    field
        .clean_value(&post("items_li0_qty=3&items_li0_note=hi&items_li1_qty=abc"))
        .await;

    assert_eq!(field.value, json!([{"qty": 3, "note": "hi"}, {"qty": null}]));
    assert!(field.records()[1].get("note").is_none());

    let errors = children_errors(&field);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].is_empty());
    assert_eq!(errors[1]["qty"], vec!["value abc is not a number"]);
    assert_eq!(field.errors, vec!["value abc is not a number"]);
}

#[tokio::test]
async fn test_rendered_names_follow_item_prefix() {
    let mut field = items_field();
    field
        .clean_value(&post("items_li0_qty=3&items_li0_note=hi&items_li1_qty=abc"))
        .await;
    let html = field.render_str();

    assert!(html.contains(r#"name="items_li0_qty" id="id_items_li0_qty" value="3""#));
    assert!(html.contains(r#"name="items_li0_note" id="id_items_li0_note" value="hi""#));
    assert!(html.contains(r#"name="items_li1_qty""#));
    assert!(html.contains(r#"<span class="error">value abc is not a number</span>"#));
    assert!(html.contains(r#"name="items_tmpl_qty""#));
    assert_eq!(html.matches(r#"<li class="nf_listfield_item">"#).count(), 2);
}

#[tokio::test]
async fn test_partial_resubmission_keeps_previous_values() {
    let mut field = items_field();
    field.set(Some(json!([
        {"qty": 5, "note": "keep me"},
        {"qty": 1, "note": "second"}
    ])));

    field.clean_value(&post("items_li0_qty=7&items_li1_note=changed")).await;

    assert!(field.errors.is_empty());
    assert_eq!(
        field.value,
        json!([
            {"qty": 7, "note": "keep me"},
            {"qty": 1, "note": "changed"}
        ])
    );
}

#[tokio::test]
async fn test_records_missing_from_payload_are_dropped() {
    let mut field = items_field();
    field.set(Some(json!([{"qty": 1}, {"qty": 2}, {"qty": 3}])));
    field.clean_value(&post("items_li2_note=last")).await;
    assert_eq!(field.value, json!([{"qty": 3, "note": "last"}]));
}

#[tokio::test]
async fn test_failing_record_does_not_affect_siblings() {
    let mut field = items_field();
    field
        .clean_value(&post("items_li0_qty=1&items_li1_note=orphan&items_li2_qty=2"))
        .await;

    assert_eq!(field.records()[0], json!({"qty": 1}));
    assert_eq!(field.records()[2], json!({"qty": 2}));
    let errors = children_errors(&field);
    assert!(errors[0].is_empty());
    assert_eq!(errors[1]["qty"], vec![REQUIRED_MESSAGE]);
    assert!(errors[2].is_empty());
}

#[tokio::test]
async fn test_every_child_failing_still_occupies_slot() {
    let items = ListField::new([
        ("qty", Field::number().required(true)),
        ("code", Field::string().required(true)),
    ])
    .unwrap();
    let mut field = Field::list(items).bind("items");
    field
        .clean_value(&post("items_li0_code=&items_li1_qty=&items_li1_code="))
        .await;

    assert_eq!(field.records().len(), 2);
    assert_eq!(children_errors(&field).len(), 2);
    for errors in children_errors(&field) {
        assert_eq!(errors.len(), 2);
    }
    assert_eq!(field.errors, vec![REQUIRED_MESSAGE]);
}

#[tokio::test]
async fn test_errors_are_unioned_without_duplicates() {
    let items = ListField::new([
        ("a", Field::string().validator(MaxLengthValidator::new(1))),
        ("b", Field::number()),
    ])
    .unwrap();
    let mut field = Field::list(items).bind("pairs");
    field
        .clean_value(&post("pairs_li0_a=xx&pairs_li0_b=x&pairs_li1_a=yy&pairs_li1_b=x"))
        .await;

    assert_eq!(
        field.errors,
        vec![
            "Ensure this value has at most 1 characters (it has 2).".to_string(),
            "value x is not a number".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_clean_is_idempotent() {
    let mut field = items_field();
    let request = post("items_li0_qty=3&items_li1_qty=oops");
    field.clean_value(&request).await;
    let first_value = field.value.clone();
    let first_errors = field.errors.clone();
    let first_children = children_errors(&field).to_vec();

    field.clean_value(&request).await;
    assert_eq!(field.value, first_value);
    assert_eq!(field.errors, first_errors);
    assert_eq!(children_errors(&field), first_children.as_slice());
}

#[tokio::test]
async fn test_empty_payload_yields_empty_list() {
    let mut field = items_field();
    field.clean_value(&post("title=unrelated")).await;
    assert_eq!(field.value, json!([]));
    assert!(children_errors(&field).is_empty());
    assert!(field.errors.is_empty());
}

#[tokio::test]
async fn test_required_list_rejects_empty_payload() {
    let mut field = items_field().required(true);
    field.clean_value(&post("")).await;
    assert_eq!(field.errors, vec![REQUIRED_MESSAGE]);
}

#[tokio::test]
async fn test_self_child_makes_scalar_list() {
    let tags = ListField::new([(SELF_FIELD, Field::string().required(true))]).unwrap();
    let mut field = Field::list(tags).bind("tags");
    field
        .clean_value(&post("tags_li0___self__=rust&tags_li1___self__=forms"))
        .await;

    assert_eq!(field.value, json!(["rust", "forms"]));

    let html = field.render_str();
    assert!(html.contains(r#"name="tags_li1___self__" id="id_tags_li1___self__" value="forms""#));
    assert!(!html.contains("field_label"));
}

#[tokio::test]
async fn test_self_child_without_input_is_null() {
    let tags = ListField::new([(SELF_FIELD, Field::string())]).unwrap();
    let mut field = Field::list(tags).bind("tags");
    field
        .clean_value(&post("tags_li0_x=1&tags_li1___self__=v"))
        .await;

    assert!(field.errors.is_empty());
    assert_eq!(field.value, json!([null, "v"]));
}

/// Holds the upload of `first.txt` until another upload has started.
#[derive(Debug, Default)]
struct HandoffStorage {
    second_started: Notify,
}

#[async_trait]
impl UploadProvider for HandoffStorage {
    async fn upload(&self, file: &TempFile, filename: &str) -> Result<StoredFile, UploadError> {
        if file.name == "first.txt" {
            self.second_started.notified().await;
        } else {
            self.second_started.notify_one();
        }
        Ok(StoredFile {
            path: filename.to_string(),
            url: format!("/handoff/{filename}"),
            size: file.size,
            metadata: Map::new(),
        })
    }

    async fn remove(&self, _path: &str) -> Result<(), UploadError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_records_clean_concurrently() {
    let items = ListField::new([
        ("label", Field::string().required(true)),
        ("attachment", Field::file(Arc::new(HandoffStorage::default()))),
    ])
    .unwrap();
    let mut field = Field::list(items).bind("docs");
    let request = FormRequest::builder()
        .body(QueryDict::parse("docs_li0_label=a&docs_li1_label=b&docs_li2_label="))
        .file("docs_li0_attachment", TempFile::new("/tmp/first", "first.txt", 1))
        .file("docs_li1_attachment", TempFile::new("/tmp/second", "second.txt", 2))
        .build();

    tokio::time::timeout(Duration::from_secs(3), field.clean_value(&request))
        .await
        .expect("the first upload never saw the second one start");

    let records = field.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["attachment"]["size"], json!(1));
    assert_eq!(records[1]["attachment"]["size"], json!(2));
    assert_eq!(records[2]["label"], Value::Null);
    assert_eq!(children_errors(&field)[2]["label"], vec![REQUIRED_MESSAGE]);
    assert_eq!(field.errors, vec![REQUIRED_MESSAGE]);
}

#[tokio::test]
async fn test_dotted_children_round_trip() {
    let people = ListField::new([
        ("name", Field::string()),
        ("address.city", Field::string()),
        ("address.zip", Field::string()),
    ])
    .unwrap();
    let mut field = Field::list(people).bind("people");
    field
        .clean_value(&post(
            "people_li0_name=Ann&people_li0_address.city=Oslo&people_li0_address.zip=0150",
        ))
        .await;

    assert_eq!(
        field.value,
        json!([{"name": "Ann", "address": {"city": "Oslo", "zip": "0150"}}])
    );

    let html = field.render_str();
    assert!(html.contains(r#"name="people_li0_address.city" id="id_people_li0_address.city" value="Oslo""#));

    let mut resubmitted = field.bind("people");
    resubmitted.set(Some(field.value.clone()));
    resubmitted
        .clean_value(&post("people_li0_address.city=Bergen"))
        .await;
    assert_eq!(
        resubmitted.value,
        json!([{"name": "Ann", "address": {"city": "Bergen", "zip": "0150"}}])
    );
}

#[tokio::test]
async fn test_file_only_index_creates_record() {
    let items = ListField::new([("qty", Field::number()), ("note", Field::string())]).unwrap();
    let mut field = Field::list(items).bind("items");

    let request = FormRequest::builder()
        .file("items_li0_scan", TempFile::new("/tmp/scan", "scan.pdf", 10))
        .build();
    field.clean_value(&request).await;

    assert_eq!(field.value, json!([{}]));
    assert_eq!(children_errors(&field), &[ChildErrors::new()]);
    assert!(field.errors.is_empty());
}

#[tokio::test]
async fn test_nested_lists() {
    let lines = ListField::new([("qty", Field::number().required(true))]).unwrap();
    let orders = ListField::new([
        ("reference", Field::string()),
        ("lines", Field::list(lines)),
    ])
    .unwrap();
    let mut field = Field::list(orders).bind("orders");

    field
        .clean_value(&post(
            "orders_li0_reference=A&orders_li0_lines_li0_qty=1&orders_li0_lines_li1_qty=2\
             &orders_li1_reference=B&orders_li1_lines_li0_qty=x",
        ))
        .await;

    assert_eq!(
        field.records()[0],
        json!({"reference": "A", "lines": [{"qty": 1}, {"qty": 2}]})
    );
    assert_eq!(field.records()[1], json!({"reference": "B", "lines": Value::Null}));
    assert_eq!(
        children_errors(&field)[1]["lines"],
        vec!["value x is not a number"]
    );
    assert_eq!(field.errors, vec!["value x is not a number"]);

    let html = field.render_str();
    assert!(html.contains(r#"name="orders_li0_lines_li1_qty" id="id_orders_li0_lines_li1_qty" value="2""#));
    assert!(html.contains(r#"name="orders_li0_lines_tmpl_qty""#));
}

#[tokio::test]
async fn test_fieldsets_shape_rendering_only() {
    let items = ListField::new([
        ("qty", Field::number().required(true)),
        ("note", Field::string()),
    ])
    .unwrap()
    .with_fieldsets(vec![Fieldset::new("Details")
        .field("note")
        .field("unknown")]);
    let mut field = Field::list(items).bind("items");
    field.clean_value(&post("items_li0_note=hello")).await;

    assert_eq!(children_errors(&field)[0]["qty"], vec![REQUIRED_MESSAGE]);

    let html = field.render_str();
    assert!(html.contains(r#"<div class="nf_fieldset"><h2>Details</h2>"#));
    assert!(html.contains(r#"name="items_li0_note""#));
    assert!(!html.contains("items_li0_qty"));
}

#[tokio::test]
async fn test_boolean_children_read_their_record() {
    let tasks = ListField::new([
        ("title", Field::string()),
        ("done", Field::boolean()),
    ])
    .unwrap();
    let mut field = Field::list(tasks).bind("tasks");
    field.set(Some(json!([{"title": "a", "done": true}, {"title": "b", "done": false}])));
    field
        .clean_value(&post("tasks_li0_title=a&tasks_li1_title=b&tasks_li1_done=on"))
        .await;
    assert_eq!(
        field.value,
        json!([{"title": "a", "done": false}, {"title": "b", "done": true}])
    );
}
