//! Leaf descriptor consumed by the state-tree engine.
//!
//! A `FieldConfig` only has to tell the engine five things about a scalar
//! field: its default value, how to transform a loaded value, how to transform a
//! value before submission, how to validate it (asynchronously) and whether it
//! is required. Concrete field types (numbers, dates, ...) live in
//! `field_types.rs` and are built on top of this type.
//!
//! Usage:
//! ```ignore
//! use forms::FieldConfig;
//! use serde_json::{json, Value};
//!
//! let host = FieldConfig::new(Value::Null)
//!     .required()
//!     .check(|v| match v.as_str() {
//!         Some(s) if s.contains(' ') => Err("No spaces allowed".into()),
//!         _ => Ok(()),
//!     });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::field_types::FieldKind;

/// Load / submit transform applied to a single value.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Outcome of a validation run: `Err` carries the message shown on the field.
pub type ValidationFuture = BoxFuture<'static, Result<(), String>>;

/// Asynchronous validator: resolves on success, rejects with a message.
pub type Validator = Arc<dyn Fn(Value) -> ValidationFuture + Send + Sync>;

/// Declarative description of one scalar field.
#[derive(Clone)]
pub struct FieldConfig {
    kind: FieldKind,
    default: Value,
    on_load: Option<Transform>,
    on_submit: Option<Transform>,
    validator: Option<Validator>,
    required: bool,
}

impl FieldConfig {
    /// Create a custom field with the given default value and no hooks.
    pub fn new(default: impl Into<Value>) -> Self {
        Self {
            kind: FieldKind::Custom,
            default: default.into(),
            on_load: None,
            on_submit: None,
            validator: None,
            required: false,
        }
    }

    pub(crate) fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Override the default value.
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Transform applied to every value entering the tree (defaults included).
    pub fn transform_on_load(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.on_load = Some(Arc::new(f));
        self
    }

    /// Transform applied when the value leaves the tree (collect / validate).
    pub fn transform_on_submit(
        mut self,
        f: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.on_submit = Some(Arc::new(f));
        self
    }

    /// Attach an asynchronous validator.
    pub fn validator<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.validator = Some(Arc::new(move |value| f(value).boxed()));
        self
    }

    /// Attach a synchronous check; it is wrapped into an already resolved future.
    pub fn check(
        mut self,
        f: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(move |value| future::ready(f(&value)).boxed()));
        self
    }

    /// Mark the field as required for the missing-required check at collect time.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    pub(crate) fn load_transform(&self) -> Option<&Transform> {
        self.on_load.as_ref()
    }

    pub(crate) fn submit_transform(&self) -> Option<&Transform> {
        self.on_submit.as_ref()
    }

    pub(crate) fn validator_fn(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Apply the load transform, if any.
    pub fn load(&self, value: Value) -> Value {
        match &self.on_load {
            Some(f) => f(value),
            None => value,
        }
    }

    /// Apply the submit transform, if any.
    pub fn submit(&self, value: Value) -> Value {
        match &self.on_submit {
            Some(f) => f(value),
            None => value,
        }
    }

    /// Submit-transform `value` and hand it to the validator.
    ///
    /// Returns `None` when the field has no validator.
    pub fn validation(&self, value: Value) -> Option<ValidationFuture> {
        let validator = self.validator.as_ref()?;
        Some(validator(self.submit(value)))
    }
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("on_load", &self.on_load.is_some())
            .field("on_submit", &self.on_submit.is_some())
            .field("validator", &self.validator.is_some())
            .field("required", &self.required)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_hooks_are_optional() {
        let field = FieldConfig::new(json!("x"));
        assert_eq!(field.default(), &json!("x"));
        assert_eq!(field.load(json!(1)), json!(1));
        assert_eq!(field.submit(json!(2)), json!(2));
        assert!(field.validation(json!(3)).is_none());
        assert!(!field.is_required());
        assert_eq!(field.kind(), FieldKind::Custom);
    }

    #[test]
    fn test_validation_sees_submitted_value() {
        let field = FieldConfig::new(Value::Null)
            .transform_on_submit(|v| json!(v.as_str().map(str::len).unwrap_or(0)))
            .check(|v| {
                if v.as_u64() == Some(3) {
                    Ok(())
                } else {
                    Err("length must be 3".into())
                }
            });

        assert_eq!(block_on(field.validation(json!("abc")).unwrap()), Ok(()));
        assert_eq!(
            block_on(field.validation(json!("ab")).unwrap()),
            Err("length must be 3".to_string())
        );
    }

    #[test]
    fn test_async_validator() {
        let field = FieldConfig::new(Value::Null).validator(|v| async move {
            if v.is_null() {
                Err("empty".to_string())
            } else {
                Ok(())
            }
        });
        assert!(field.has_validator());
        assert_eq!(
            block_on(field.validation(Value::Null).unwrap()),
            Err("empty".to_string())
        );
    }
}
