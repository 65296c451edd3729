//! Shape of a failed submission as handed back by the transport layer.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::Result;
use crate::path::FieldPath;

/// HTTP status servers use to report per-field validation failures.
pub const VALIDATION_FAILED: u16 = 422;

/// A rejected submission: the response status plus its decoded body.
///
/// Only `data.errors` is ever read. It is expected to be a flat object from
/// dotted path to message, where a message may also be an array of strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmitError {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub data: Value,
}

impl SubmitError {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// Decode a raw response envelope, e.g. `{"status": 422, "data": {...}}`.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_validation_failure(&self) -> bool {
        self.status == VALIDATION_FAILED
    }

    /// Path/message pairs from `data.errors`, in the order the server sent them.
    ///
    /// `None` when the body carries no error mapping. Entries whose message is
    /// neither a string nor an array starting with a string are dropped.
    pub fn field_errors(&self) -> Option<Vec<(FieldPath, String)>> {
        let errors = self.data.get("errors")?.as_object()?;
        Some(
            errors
                .iter()
                .filter_map(|(path, message)| {
                    let message = match message {
                        Value::String(s) => s.clone(),
                        Value::Array(items) => items.first()?.as_str()?.to_string(),
                        _ => return None,
                    };
                    Some((FieldPath::from(path.as_str()), message))
                })
                .collect(),
        )
    }
}
