//! Form controller: owns the current snapshot, the dirty flag and the
//! load/collect/reset lifecycle.
//!
//! Every mutation swaps in a new `Arc<FormTree>`. Readers holding an older
//! snapshot keep seeing it unchanged, and nodes an update did not touch stay
//! shared between the two.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::builder::build;
use crate::collector;
use crate::config::FormConfig;
use crate::debounce::ValidationScheduler;
use crate::errors::Result;
use crate::path::Scope;
use crate::schema::Schema;
use crate::submit_error::SubmitError;
use crate::tree::{FieldNode, FormTree};
use crate::validation::{
    apply_errors_by_path, has_errors, has_missing_required, mark_missing_required,
};

struct FormInner {
    tree: Arc<FormTree>,
    dirty: bool,
    /// Bumped whenever the whole tree is replaced by `load_values` or
    /// `reset_form`. Validation results from an older epoch are dropped.
    epoch: u64,
    /// `has_errors` result for the snapshot it was computed on.
    errors_memo: Option<(Arc<FormTree>, bool)>,
}

/// Cloneable handle to one form instance.
///
/// Clones share the same state and the same validation debounce table,
/// which is how debounced validations write their results back after the
/// caller has moved on.
#[derive(Clone)]
pub struct FormController {
    inner: Arc<Mutex<FormInner>>,
    schema: Arc<Schema>,
    initial: Arc<FormTree>,
    config: Arc<FormConfig>,
    scheduler: ValidationScheduler,
}

impl FormController {
    /// Build the form from `schema` and optional initial values.
    pub fn new(schema: impl Into<Arc<Schema>>, initial: Option<&Value>) -> Self {
        Self::with_config(schema, initial, FormConfig::default())
    }

    pub fn with_config(
        schema: impl Into<Arc<Schema>>,
        initial: Option<&Value>,
        config: FormConfig,
    ) -> Self {
        let schema = schema.into();
        let tree = Arc::new(build(&schema, initial));
        debug!(fields = schema.len(), "form created");
        Self {
            inner: Arc::new(Mutex::new(FormInner {
                tree: tree.clone(),
                dirty: false,
                epoch: 0,
                errors_memo: None,
            })),
            schema,
            initial: tree,
            config: Arc::new(config),
            scheduler: ValidationScheduler::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in a whole new tree, clear dirty and drop every validation that
    /// was scheduled against the old one.
    fn replace_tree(&self, tree: Arc<FormTree>) {
        {
            let mut inner = self.lock();
            inner.tree = tree;
            inner.dirty = false;
            inner.epoch += 1;
        }
        self.scheduler.cancel_all();
    }

    /// Replace the whole tree with one rebuilt from `values` and clear dirty.
    ///
    /// Pending validations are cancelled; they belonged to the old values.
    pub fn load_values(&self, values: &Value) {
        self.replace_tree(Arc::new(build(&self.schema, Some(values))));
        debug!("form values loaded");
    }

    /// Project the current snapshot into a submission payload.
    ///
    /// With `validate_required`, a form that still has empty required fields
    /// gets those fields marked and `None` comes back; nothing is submitted.
    /// A successful collect clears dirty.
    pub fn collect(&self, validate_required: bool) -> Option<Value> {
        let mut inner = self.lock();
        if validate_required && has_missing_required(&inner.tree, &self.schema) {
            let message = &self.config.required_message;
            let marked = mark_missing_required(&inner.tree, &self.schema, message);
            inner.tree = Arc::new(marked);
            debug!("submission blocked by missing required fields");
            return None;
        }
        inner.dirty = false;
        Some(collector::collect(&inner.tree, &self.schema))
    }

    /// Fold a rejected submission back into the form.
    ///
    /// Validation failures with a path mapping attach their messages to the
    /// addressed fields. The form ends up dirty either way.
    pub fn handle_submit_error(&self, error: &SubmitError) {
        let mut inner = self.lock();
        if error.is_validation_failure() {
            match error.field_errors() {
                Some(errors) => {
                    debug!(count = errors.len(), "applying server field errors");
                    inner.tree = Arc::new(apply_errors_by_path(&inner.tree, errors));
                }
                None => warn!(status = error.status, "validation failure without field errors"),
            }
        } else {
            debug!(status = error.status, "submission failed");
        }
        inner.dirty = true;
    }

    /// Go back to the snapshot built when the form was created.
    ///
    /// Pending validations are cancelled, so the restored snapshot stays as
    /// it was built.
    pub fn reset_form(&self) {
        self.replace_tree(self.initial.clone());
        debug!("form reset");
    }

    /// Whether any field carries an error. Cached until the snapshot changes.
    pub fn has_errors(&self) -> bool {
        let mut inner = self.lock();
        if let Some((tree, result)) = &inner.errors_memo {
            if Arc::ptr_eq(tree, &inner.tree) {
                return *result;
            }
        }
        let result = has_errors(&inner.tree);
        inner.errors_memo = Some((inner.tree.clone(), result));
        result
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.lock().dirty = dirty;
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<FormTree> {
        self.lock().tree.clone()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_arc(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Debounce table shared by every binding on this form.
    pub fn scheduler(&self) -> &ValidationScheduler {
        &self.scheduler
    }

    /// Identifies the current tree lineage; see [`FormController::set_field_in_epoch`].
    pub(crate) fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Replace key `name` of the sub-form at `scope` with `f` applied to its
    /// current node.
    ///
    /// The swap happens under the form's lock, so `f` always sees the latest
    /// snapshot. On error the snapshot is left as it was.
    pub fn set_field<F>(&self, scope: &Scope, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&FieldNode) -> Result<FieldNode>,
    {
        let mut inner = self.lock();
        let next = inner.tree.update_in(scope, name, f)?;
        inner.tree = Arc::new(next);
        trace!(field = %scope.path_to(name), "field replaced");
        Ok(())
    }

    /// Like [`FormController::set_field`], but only while the tree still
    /// descends from `epoch`. Returns `Ok(false)` without touching anything
    /// once the tree has been reloaded or reset.
    pub(crate) fn set_field_in_epoch<F>(
        &self,
        epoch: u64,
        scope: &Scope,
        name: &str,
        f: F,
    ) -> Result<bool>
    where
        F: FnOnce(&FieldNode) -> Result<FieldNode>,
    {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            let current = inner.epoch;
            trace!(field = %scope.path_to(name), epoch, current, "stale write dropped");
            return Ok(false);
        }
        let next = inner.tree.update_in(scope, name, f)?;
        inner.tree = Arc::new(next);
        trace!(field = %scope.path_to(name), "field replaced");
        Ok(true)
    }
}
