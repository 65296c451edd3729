//! End-to-end behaviour of a form: controller lifecycle, binding operations
//! and debounced validation against an invoice-like schema.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use forms::field_types::{number_field, string_field, FieldOptions, REQUIRED_MESSAGE};
use forms::{FieldConfig, FormBinding, FormController, Schema, SubmitError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn invoice() -> Schema {
    Schema::new()
        .field("name", string_field(FieldOptions::default().required()))
        .field("amount", number_field(FieldOptions::default().required().positive()))
        .group(
            "items",
            Schema::new().field("qty", number_field(FieldOptions::default())),
        )
}

/// Invoice whose `amount` validator records every value it is asked about.
/// Checking the value 1 takes two seconds and then fails.
fn recording_invoice() -> (Schema, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let amount = number_field(FieldOptions::default().required()).validator(move |value: Value| {
        log.lock().unwrap().push(value.clone());
        async move {
            if value == json!(1) {
                tokio::time::sleep(Duration::from_secs(2)).await;
                return Err("slow and stale".to_string());
            }
            match value.as_f64() {
                Some(n) if n > 0.0 => Ok(()),
                _ => Err("must be positive".to_string()),
            }
        }
    });
    let schema = Schema::new()
        .field("name", string_field(FieldOptions::default()))
        .field("amount", amount);
    (schema, seen)
}

#[test]
fn blank_form_blocks_submission_on_required_fields() {
    let form = FormController::new(invoice(), None);
    let state = form.state();
    assert_eq!(state.group("items").unwrap().len(), 1);
    assert_eq!(state.entry("items", 0).unwrap().value("qty"), Some(&Value::Null));

    assert_eq!(form.collect(true), None);
    let state = form.state();
    assert_eq!(state.error("name"), Some(REQUIRED_MESSAGE));
    assert_eq!(state.error("amount"), Some(REQUIRED_MESSAGE));
    assert_eq!(state.entry("items", 0).unwrap().error("qty"), None);
    assert!(form.has_errors());
}

#[test]
fn add_subform_appends_seeded_entry() {
    let form = FormBinding::new(FormController::new(invoice(), None));
    form.add_subform("items", Some(&json!({ "qty": 5 }))).unwrap();

    let items = form.sub_states("items").unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].fields().unwrap().value("qty"), Some(&json!("5")));
    assert!(form.is_dirty());

    form.set_field_value("name", "acme").unwrap();
    form.set_field_value("amount", "10").unwrap();
    let payload = form.form().collect(true).unwrap();
    assert_eq!(payload["items"], json!([{ "qty": null }, { "qty": 5 }]));
}

#[test]
fn remove_subform_keeps_order_of_the_rest() {
    let form = FormBinding::new(FormController::new(
        invoice(),
        Some(&json!({ "items": [{ "qty": 1 }, { "qty": 2 }] })),
    ));
    let before = form.form().state();
    let former_second = before.entry("items", 1).unwrap().clone();

    form.remove_subform("items", 0).unwrap();
    let after = form.form().state();
    let items = after.group("items").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(*items[0], *former_second);
    assert!(Arc::ptr_eq(&items[0], &former_second));
    assert!(form.is_dirty());
}

#[test]
fn server_errors_land_on_their_fields() {
    let form = FormController::new(
        invoice(),
        Some(&json!({ "name": "acme", "amount": 3, "items": [{}, {}, {}] })),
    );
    let error = SubmitError::from_json_str(
        r#"{
            "status": 422,
            "data": { "errors": {
                "amount": ["too small"],
                "items.1.qty": "out of stock",
                "items.7.qty": "no such entry"
            } }
        }"#,
    )
    .unwrap();
    form.handle_submit_error(&error);

    let state = form.state();
    assert_eq!(state.error("amount"), Some("too small"));
    assert_eq!(state.error("name"), None);
    let errors: Vec<_> = state
        .group("items")
        .unwrap()
        .iter()
        .map(|item| item.error("qty"))
        .collect();
    assert_eq!(errors, vec![None, Some("out of stock"), None]);
    assert!(form.is_dirty());
    assert!(form.has_errors());
}

#[test]
fn unrelated_submit_errors_only_mark_dirty() {
    let form = FormController::new(invoice(), None);
    form.handle_submit_error(&SubmitError::new(503, Value::Null));
    assert!(form.is_dirty());
    assert!(!form.has_errors());

    form.handle_submit_error(&SubmitError::new(422, json!({ "errors": "everything" })));
    assert!(form.is_dirty());
    assert!(!form.has_errors());
}

#[test]
fn load_reset_and_collect_cycle() {
    let form = FormController::new(invoice(), Some(&json!({ "name": "draft", "amount": 1 })));
    form.load_values(&json!({ "name": "final", "amount": 1234.5, "items": [{ "qty": 2 }] }));
    assert_eq!(form.state().value("amount"), Some(&json!("1,234.5")));
    assert!(!form.is_dirty());

    form.set_dirty(true);
    let payload = form.collect(true).unwrap();
    assert_eq!(
        payload,
        json!({ "name": "final", "amount": 1234.5, "items": [{ "qty": 2 }] })
    );
    assert!(!form.is_dirty());

    form.reset_form();
    assert_eq!(form.state().value("name"), Some(&json!("draft")));
}

#[test]
fn schema_from_descriptor_drives_the_form() {
    let schema = Schema::from_json_str(
        r#"{
            "name":  { "type": "string", "required": true },
            "items": { "qty": { "type": "number", "default": 1 } }
        }"#,
    )
    .unwrap();
    let form = FormController::new(schema, Some(&json!({ "name": "acme" })));
    assert_eq!(
        form.collect(true).unwrap(),
        json!({ "name": "acme", "items": [{ "qty": 1 }] })
    );
}

#[test]
fn custom_field_round_trip() {
    let schema = Schema::new()
        .field("code", FieldConfig::new(json!("")).required())
        .field("flags", FieldConfig::new(json!([])));
    let form = FormController::new(schema, Some(&json!({ "code": "X1", "flags": ["a"] })));
    assert_eq!(form.collect(true).unwrap(), json!({ "code": "X1", "flags": ["a"] }));
}

#[tokio::test(start_paused = true)]
async fn rapid_changes_validate_only_the_last_value() {
    let (schema, seen) = recording_invoice();
    let form = FormBinding::new(FormController::new(schema, None));

    form.change_field("amount", "1", true).unwrap();
    form.change_field("amount", "12", true).unwrap();
    assert_eq!(form.fields().unwrap().value("amount"), Some(&json!("12")));
    assert!(form.is_dirty());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(*seen.lock().unwrap(), vec![json!(12)]);
    assert_eq!(form.fields().unwrap().error("amount"), None);
}

#[tokio::test(start_paused = true)]
async fn stale_in_flight_validation_is_discarded() {
    let (schema, seen) = recording_invoice();
    let form = FormBinding::new(FormController::new(schema, None));

    // "1" passes the debounce and starts its slow check.
    form.change_field("amount", "1", true).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(*seen.lock().unwrap(), vec![json!(1)]);

    form.change_field("amount", "-3", true).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(form.fields().unwrap().error("amount"), Some("must be positive"));

    // Long after the slow check would have finished, the newer result stands.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(form.fields().unwrap().error("amount"), Some("must be positive"));
    assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!(-3)]);
}

#[tokio::test(start_paused = true)]
async fn validation_in_group_entries_is_independent() {
    let form = FormBinding::new(FormController::new(
        invoice(),
        Some(&json!({ "items": [{}, {}] })),
    ));
    let items = form.sub_states("items").unwrap();
    items[0].change_field("qty", "abc", true).unwrap();
    items[1].change_field("qty", "7", true).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let state = form.form().state();
    assert_eq!(
        state.entry("items", 0).unwrap().error("qty"),
        Some(forms::field_types::NUMERIC_MESSAGE)
    );
    assert_eq!(state.entry("items", 1).unwrap().error("qty"), None);
}

#[tokio::test(start_paused = true)]
async fn reset_and_reload_discard_pending_validation() {
    let form = FormBinding::new(FormController::new(invoice(), Some(&json!({ "amount": 2 }))));

    form.change_field("amount", "abc", true).unwrap();
    form.form().reset_form();
    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = form.form().state();
    assert_eq!(state.value("amount"), Some(&json!("2")));
    assert_eq!(state.error("amount"), None);
    assert!(!form.form().has_errors());

    form.change_field("amount", "abc", true).unwrap();
    form.form().load_values(&json!({ "amount": 5 }));
    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = form.form().state();
    assert_eq!(state.value("amount"), Some(&json!("5")));
    assert_eq!(state.error("amount"), None);
    assert!(!form.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn check_in_flight_during_reload_is_discarded() {
    let (schema, seen) = recording_invoice();
    let form = FormBinding::new(FormController::new(schema, None));

    // The check for 1 is still running when the values are replaced.
    form.change_field("amount", "1", true).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(*seen.lock().unwrap(), vec![json!(1)]);
    form.form().load_values(&json!({ "amount": 7 }));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(form.fields().unwrap().error("amount"), None);
}

#[tokio::test(start_paused = true)]
async fn bindings_on_one_form_coalesce_per_field() {
    let (schema, seen) = recording_invoice();
    let controller = FormController::new(schema, None);
    let first = FormBinding::new(controller.clone());
    let second = FormBinding::new(controller.clone());

    first.change_field("amount", "1", true).unwrap();
    second.change_field("amount", "12", true).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(*seen.lock().unwrap(), vec![json!(12)]);
    assert_eq!(controller.state().error("amount"), None);
}

#[tokio::test(start_paused = true)]
async fn removing_a_later_entry_keeps_earlier_validation() {
    let form = FormBinding::new(FormController::new(
        invoice(),
        Some(&json!({ "items": [{}, {}, {}] })),
    ));
    let items = form.sub_states("items").unwrap();
    items[0].change_field("qty", "abc", true).unwrap();
    items[2].change_field("qty", "xyz", true).unwrap();
    form.remove_subform("items", 1).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let state = form.form().state();
    assert_eq!(
        state.entry("items", 0).unwrap().error("qty"),
        Some(forms::field_types::NUMERIC_MESSAGE)
    );
    // The check for the shifted entry was cancelled with the removal.
    assert_eq!(state.entry("items", 1).unwrap().error("qty"), None);
    assert_eq!(state.entry("items", 1).unwrap().value("qty"), Some(&json!("xyz")));
}
