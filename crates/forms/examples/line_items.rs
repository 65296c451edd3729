//! Walk through an invoice form: blocked submit, line items, debounced
//! validation and a server-side rejection.
//!
//! Run with `RUST_LOG=forms=debug cargo run -p forms --example line_items`.

use std::time::Duration;

use anyhow::Result;
use forms::{FormBinding, FormConfig, FormController, Schema, SubmitError};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

const SCHEMA: &str = r#"{
    "customer": { "type": "string", "required": true },
    "due":      { "type": "date" },
    "items": {
        "description": { "type": "string", "required": true },
        "amount":      { "type": "number", "required": true, "positive": true },
        "qty":         { "type": "number", "default": 1 }
    }
}"#;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forms=debug".parse()?),
        )
        .init();

    let config = FormConfig::load(std::env::current_dir()?)?;
    let schema = Schema::from_json_str(SCHEMA)?;
    let form = FormBinding::new(FormController::with_config(schema, None, config));

    if form.form().collect(true).is_none() {
        info!(has_errors = form.form().has_errors(), "submission blocked");
    }

    form.change_field("customer", "ACME Corp", true)?;
    let first = form.sub_state("items", 0)?;
    first.change_field("description", "Consulting", true)?;
    first.change_field("amount", "-40", true)?;

    let travel = json!({ "description": "Travel", "amount": 120 });
    let index = form.add_subform("items", Some(&travel))?;
    info!(index, "line item added");

    tokio::time::sleep(form.form().config().debounce() + Duration::from_millis(50)).await;
    info!(
        error = ?first.fields()?.error("amount"),
        "validation finished for first line item"
    );

    first.change_field("amount", "1,500.25", true)?;
    tokio::time::sleep(form.form().config().debounce() + Duration::from_millis(50)).await;

    if let Some(payload) = form.form().collect(true) {
        info!(payload = %serde_json::to_string_pretty(&payload)?, "collected");
    }

    let rejection = SubmitError::new(
        422,
        json!({ "errors": { "items.1.amount": "exceeds travel budget" } }),
    );
    form.form().handle_submit_error(&rejection);
    info!(
        dirty = form.is_dirty(),
        has_errors = form.form().has_errors(),
        "server rejected the invoice"
    );

    form.form().reset_form();
    info!(items = form.sub_states("items")?.len(), "form reset");
    Ok(())
}
