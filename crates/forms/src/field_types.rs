//! Catalog of ready-made field types.
//!
//! Every constructor returns a plain [`FieldConfig`]; the engine does not know
//! about kinds beyond what the config exposes. `FieldOptions` carries the two
//! modifiers the catalog understands (`required`, `positive`) and an optional
//! default override.
//!
//! ```ignore
//! use forms::field_types::{number_field, string_field, FieldOptions};
//!
//! let amount = number_field(FieldOptions::default().required().positive());
//! let note = string_field(FieldOptions::default());
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::field::FieldConfig;

pub const REQUIRED_MESSAGE: &str = "The field is required";
pub const NUMERIC_MESSAGE: &str = "This must be a numeric value";
pub const POSITIVE_MESSAGE: &str = "This must be a positive number";
pub const BOOLEAN_MESSAGE: &str = "This must be a boolean value";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ISO_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Field kinds known to the catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Date,
    DateTime,
    String,
    Option,
    Boolean,
    Hidden,
    Array,
    /// Hand-built [`FieldConfig`] outside the catalog.
    Custom,
}

/// Modifiers applied on top of a field kind.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    pub required: bool,
    /// Only honoured by number fields.
    pub positive: bool,
    pub default: Option<Value>,
}

impl FieldOptions {
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

type Check = fn(&Value) -> Result<(), String>;

impl FieldKind {
    /// Build a field of this kind. `Array` builds an array of untyped items; use
    /// [`array_of`] to pick the element type.
    pub fn build(self, options: &FieldOptions) -> FieldConfig {
        if self == FieldKind::Array {
            return array_of(FieldConfig::new(Value::Null), options);
        }

        let mut checks: Vec<Check> = Vec::new();
        if options.required {
            checks.push(check_required);
        }

        let mut field = match self {
            FieldKind::Number => {
                checks.push(check_numeric);
                if options.positive {
                    checks.push(check_positive);
                }
                FieldConfig::new(Value::Null)
                    .transform_on_load(load_number)
                    .transform_on_submit(submit_number)
            }
            FieldKind::Date => FieldConfig::new(Value::Null)
                .transform_on_load(|v| load_date(v, DATE_FORMAT))
                .transform_on_submit(|v| submit_date(v, DATE_FORMAT)),
            FieldKind::DateTime => FieldConfig::new(Value::Null)
                .transform_on_load(|v| load_date(v, ISO_DATE_TIME_FORMAT))
                .transform_on_submit(|v| submit_date(v, DATE_TIME_FORMAT)),
            FieldKind::Boolean => {
                checks.push(check_boolean);
                FieldConfig::new(Value::Bool(true))
            }
            FieldKind::String
            | FieldKind::Option
            | FieldKind::Hidden
            | FieldKind::Custom
            | FieldKind::Array => FieldConfig::new(Value::Null),
        };

        field = field.with_kind(self);
        if options.required {
            field = field.required();
        }
        if let Some(default) = &options.default {
            field = field.default_value(default.clone());
        }
        if !checks.is_empty() {
            field = field.check(move |value| run_checks(&checks, value));
        }
        field
    }
}

pub fn number_field(options: FieldOptions) -> FieldConfig {
    FieldKind::Number.build(&options)
}

pub fn date_field(options: FieldOptions) -> FieldConfig {
    FieldKind::Date.build(&options)
}

pub fn date_time_field(options: FieldOptions) -> FieldConfig {
    FieldKind::DateTime.build(&options)
}

pub fn string_field(options: FieldOptions) -> FieldConfig {
    FieldKind::String.build(&options)
}

pub fn option_field(options: FieldOptions) -> FieldConfig {
    FieldKind::Option.build(&options)
}

pub fn boolean_field(options: FieldOptions) -> FieldConfig {
    FieldKind::Boolean.build(&options)
}

pub fn hidden_field(options: FieldOptions) -> FieldConfig {
    FieldKind::Hidden.build(&options)
}

/// Scalar field holding a JSON array whose items behave like `element`.
///
/// Load and submit transforms are mapped over the items; the element validator
/// runs on every item and the first rejection wins.
pub fn array_of(element: FieldConfig, options: &FieldOptions) -> FieldConfig {
    let mut field = FieldConfig::new(Value::Array(Vec::new())).with_kind(FieldKind::Array);

    if let Some(on_load) = element.load_transform().cloned() {
        field = field.transform_on_load(move |v| map_items(v, &on_load));
    }
    if let Some(on_submit) = element.submit_transform().cloned() {
        field = field.transform_on_submit(move |v| map_items(v, &on_submit));
    }
    if options.required {
        field = field.required();
    }
    if let Some(default) = &options.default {
        field = field.default_value(default.clone());
    }

    let item_validator = element.validator_fn().cloned();
    let required = options.required;
    if required || item_validator.is_some() {
        field = field.validator(move |value| {
            let item_validator = item_validator.clone();
            async move {
                if required {
                    check_required_array(&value)?;
                }
                if let (Some(validate), Value::Array(items)) = (item_validator, value) {
                    for item in items {
                        validate(item).await?;
                    }
                }
                Ok(())
            }
            .boxed()
        });
    }
    field
}

fn map_items(value: Value, f: &Arc<dyn Fn(Value) -> Value + Send + Sync>) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(|item| f(item)).collect()),
        other => other,
    }
}

fn run_checks(checks: &[Check], value: &Value) -> Result<(), String> {
    checks.iter().try_for_each(|check| check(value))
}

fn check_required(value: &Value) -> Result<(), String> {
    match value {
        Value::Null => Err(REQUIRED_MESSAGE.into()),
        Value::String(s) if s.is_empty() => Err(REQUIRED_MESSAGE.into()),
        _ => Ok(()),
    }
}

fn check_required_array(value: &Value) -> Result<(), String> {
    match value {
        Value::Array(items) if items.is_empty() => Err(REQUIRED_MESSAGE.into()),
        other => check_required(other),
    }
}

fn check_numeric(value: &Value) -> Result<(), String> {
    match value {
        Value::Null | Value::Number(_) => Ok(()),
        Value::String(s) if s.is_empty() => Ok(()),
        _ => Err(NUMERIC_MESSAGE.into()),
    }
}

fn check_positive(value: &Value) -> Result<(), String> {
    match value.as_f64() {
        Some(n) if n <= 0.0 => Err(POSITIVE_MESSAGE.into()),
        _ => Ok(()),
    }
}

fn check_boolean(value: &Value) -> Result<(), String> {
    match value {
        Value::Null | Value::Bool(_) => Ok(()),
        Value::String(s) if s == "true" || s == "false" => Ok(()),
        _ => Err(BOOLEAN_MESSAGE.into()),
    }
}

// --- number -------------------------------------------------------------------------------------

fn load_number(value: Value) -> Value {
    let parsed = match &value {
        Value::Null => return Value::Null,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Value::String(format_number(n)),
        _ => value,
    }
}

fn submit_number(value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    let mut cleaned = String::with_capacity(trimmed.len());
    if trimmed.starts_with('-') {
        cleaned.push('-');
    }
    cleaned.extend(trimmed.chars().filter(|c| c.is_ascii_digit() || *c == '.'));

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => number_value(n),
        _ => value,
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Render with at most two fraction digits and `,` as thousands separator.
pub fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

// --- dates --------------------------------------------------------------------------------------

fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for format in [DATE_TIME_FORMAT, "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn load_date(value: Value, format: &str) -> Value {
    match &value {
        Value::String(s) if !s.is_empty() => match parse_date_time(s) {
            Some(dt) => Value::String(dt.format(format).to_string()),
            None => value,
        },
        Value::String(_) | Value::Null | Value::Bool(false) => Value::Null,
        _ => value,
    }
}

fn submit_date(value: Value, format: &str) -> Value {
    match &value {
        Value::String(s) => parse_date_time(s)
            .map(|dt| Value::String(dt.format(format).to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
