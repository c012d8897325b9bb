//! The composite clean: fan out one task per (record, child), wait for all
//! of them, then rebuild the records.

use std::sync::Arc;

use formwork_http::FormRequest;
use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::decode::{raw_input, ListPayload};
use super::{ChildErrors, SELF_FIELD};
use crate::fields::{Field, FieldKind};
use crate::path::{deep_read, deep_write};

struct ChildOutcome {
    slot: usize,
    name: String,
    supplied: bool,
    value: Value,
    errors: Vec<String>,
}

async fn clean_child(
    slot: usize,
    mut child: Field,
    input: Option<Value>,
    request: Arc<FormRequest>,
) -> ChildOutcome {
    let supplied = input.is_some();
    child.set(input);
    child.clean_value(&request).await;
    trace!(field = %child.name, slot, errors = child.errors.len(), "cleaned list child");
    ChildOutcome {
        slot,
        name: child.name,
        supplied,
        value: child.value,
        errors: child.errors,
    }
}

/// Rebuilds one record from its `(child name, value)` pairs.
///
/// Dotted names become nested objects. A `__self__` entry replaces the
/// whole record.
fn assemble_record(pairs: Vec<(String, Value)>) -> Value {
    let mut record = Map::new();
    for (name, value) in pairs {
        deep_write(&mut record, &name, value);
    }
    record
        .remove(SELF_FIELD)
        .unwrap_or(Value::Object(record))
}

/// Cleans a list field against `request`.
///
/// The value held before the clean is the fallback for children missing
/// from the payload: a record submitted at index `i` reads it from
/// `previous[i]`. Every submitted index keeps its slot in the output, even
/// when all of its children fail.
pub(crate) async fn clean_list(field: &mut Field, request: &FormRequest) {
    let previous = match std::mem::take(&mut field.value) {
        Value::Array(records) => records,
        _ => Vec::new(),
    };
    let FieldKind::List(list) = &field.kind else {
        return;
    };

    let payload = ListPayload::decode(&field.name, &request.body, &request.files);
    debug!(field = %field.name, records = payload.len(), "decoded list payload");

    let mut tasks = Vec::with_capacity(payload.len() * list.fields.len());
    for (slot, record) in payload.records().iter().enumerate() {
        let view = Arc::new(request.with_payload(record.body().clone(), record.files().clone()));
        let fallback = record.position().and_then(|p| previous.get(p));
        for (child_name, template) in &list.fields {
            let input = raw_input(record.body(), child_name)
                .or_else(|| fallback.and_then(|r| deep_read(r, child_name)).cloned());
            tasks.push(clean_child(
                slot,
                template.bind(child_name.as_str()),
                input,
                Arc::clone(&view),
            ));
        }
    }

    let outcomes = join_all(tasks).await;

    let mut records: Vec<Vec<(String, Value)>> = vec![Vec::new(); payload.len()];
    let mut children_errors: Vec<ChildErrors> = vec![ChildErrors::new(); payload.len()];
    for outcome in outcomes {
        if outcome.errors.is_empty() {
            // A record without `__self__` input still becomes null.
            if outcome.supplied || !outcome.value.is_null() || outcome.name == SELF_FIELD {
                records[outcome.slot].push((outcome.name, outcome.value));
            }
            continue;
        }
        for error in &outcome.errors {
            if !field.errors.contains(error) {
                field.errors.push(error.clone());
            }
        }
        records[outcome.slot].push((outcome.name.clone(), Value::Null));
        children_errors[outcome.slot].insert(outcome.name, outcome.errors);
    }

    field.value = Value::Array(records.into_iter().map(assemble_record).collect());
    if let FieldKind::List(list) = &mut field.kind {
        list.children_errors = children_errors;
    }
    field.run_base_checks();
}
