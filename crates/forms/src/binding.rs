//! Field-level binding on top of a [`FormController`].
//!
//! A `FormBinding` is bound to one form and one [`Scope`]: the root form, or a
//! single entry of a repeatable group (possibly nested). All operations name
//! fields relative to that scope, so UI code can render a group entry the
//! same way it renders the top-level form.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::builder::build;
use crate::controller::FormController;
use crate::errors::{FormError, Result};
use crate::path::Scope;
use crate::schema::Schema;
use crate::tree::{FieldNode, FormTree, Leaf};

#[derive(Clone)]
pub struct FormBinding {
    form: FormController,
    scope: Scope,
}

fn replace_leaf(
    node: &FieldNode,
    name: &str,
    f: impl FnOnce(&Leaf) -> Leaf,
) -> Result<FieldNode> {
    match node {
        FieldNode::Leaf(leaf) => Ok(FieldNode::Leaf(Arc::new(f(leaf)))),
        FieldNode::Group(_) => Err(FormError::NotALeaf(name.to_string())),
    }
}

fn scoped_tree<'a>(tree: &'a FormTree, scope: &Scope) -> Result<&'a FormTree> {
    scope.steps().iter().try_fold(tree, |tree, step| {
        let entries = tree
            .group(&step.group)
            .ok_or_else(|| FormError::NotAGroup(step.group.clone()))?;
        entries
            .get(step.index)
            .map(Arc::as_ref)
            .ok_or_else(|| FormError::IndexOutOfBounds {
                group: step.group.clone(),
                index: step.index,
                len: entries.len(),
            })
    })
}

impl FormBinding {
    /// Bind the top level of `form`.
    pub fn new(form: FormController) -> Self {
        Self {
            form,
            scope: Scope::root(),
        }
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Entry index inside the parent group; `None` for the root form.
    pub fn index(&self) -> Option<usize> {
        self.scope.last().map(|step| step.index)
    }

    pub fn is_dirty(&self) -> bool {
        self.form.is_dirty()
    }

    /// Current values and errors of the bound (sub-)form.
    pub fn fields(&self) -> Result<FormTree> {
        let state = self.form.state();
        scoped_tree(&state, &self.scope).cloned()
    }

    /// Schema of the bound (sub-)form.
    pub fn schema(&self) -> Result<&Schema> {
        self.form
            .schema()
            .scoped(&self.scope)
            .ok_or(FormError::UnboundScope)
    }

    fn mark_dirty(&self) {
        if !self.form.is_dirty() {
            self.form.set_dirty(true);
        }
    }

    /// Replace a field's value, keeping its error.
    pub fn set_field_value(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.schema()?.require_field(name)?;
        let value = value.into();
        self.form.set_field(&self.scope, name, |node| {
            replace_leaf(node, name, |leaf| leaf.with_value(value))
        })
    }

    /// Replace a field's error, keeping its value.
    pub fn set_field_error(&self, name: &str, error: Option<String>) -> Result<()> {
        self.schema()?.require_field(name)?;
        self.form.set_field(&self.scope, name, |node| {
            replace_leaf(node, name, |leaf| leaf.with_error(error))
        })
    }

    /// Schedule a debounced check of `value` against the field's validator.
    ///
    /// Calls for the same field within the debounce window collapse into one
    /// check of the last value. A passing check clears the field's error, a
    /// failing one stores its message. Fields without a validator have their
    /// error cleared right away.
    ///
    /// The debounce table is shared by every binding on the form. A result
    /// that arrives after `load_values` or `reset_form` is dropped.
    pub fn validate_field(&self, name: &str, value: Value) -> Result<()> {
        let config = self.schema()?.require_field(name)?;
        if !config.has_validator() {
            return self.set_field_error(name, None);
        }

        let path = self.scope.path_to(name);
        let epoch = self.form.epoch();
        let schema = self.form.schema_arc();
        let form = self.form.clone();
        let scope = self.scope.clone();
        let field = name.to_string();
        let check_scope = scope.clone();
        let check_field = field.clone();

        debug!(field = %path, "validation scheduled");
        self.form.scheduler().schedule(
            path.to_string(),
            self.form.config().debounce(),
            move || {
                schema
                    .scoped(&check_scope)
                    .and_then(|schema| schema.field_config(&check_field))
                    .and_then(|config| config.validation(value))
                    .unwrap_or_else(|| futures::future::ready(Ok::<(), String>(())).boxed())
            },
            move |outcome| {
                let error = outcome.err();
                let result = form.set_field_in_epoch(epoch, &scope, &field, |node| {
                    replace_leaf(node, &field, |leaf| leaf.with_error(error))
                });
                let path = scope.path_to(&field);
                match result {
                    Ok(true) => {}
                    Ok(false) => debug!(field = %path, "form replaced, result dropped"),
                    Err(err) => warn!(field = %path, %err, "validation result dropped"),
                }
            },
        )
    }

    /// Kick off validation, store the value, then mark the form dirty when
    /// `affects_dirty` is set.
    pub fn change_field_value(
        &self,
        name: &str,
        value: impl Into<Value>,
        affects_dirty: bool,
    ) -> Result<()> {
        let value = value.into();
        self.validate_field(name, value.clone())?;
        self.set_field_value(name, value)?;
        if affects_dirty {
            self.mark_dirty();
        }
        Ok(())
    }

    /// Text input change.
    pub fn change_field(
        &self,
        name: &str,
        text: impl Into<String>,
        affects_dirty: bool,
    ) -> Result<()> {
        self.change_field_value(name, Value::String(text.into()), affects_dirty)
    }

    /// Choice from a select-like input; the option is stored as given.
    pub fn select_field(
        &self,
        name: &str,
        option: impl Into<Value>,
        affects_dirty: bool,
    ) -> Result<()> {
        self.change_field_value(name, option, affects_dirty)
    }

    /// Append a new entry to `group`, built from `seed` like any other entry.
    /// Returns the index of the new entry.
    pub fn add_subform(&self, group: &str, seed: Option<&Value>) -> Result<usize> {
        let entry = Arc::new(build(self.schema()?.require_group(group)?, seed));
        let mut index = 0;
        self.form.set_field(&self.scope, group, |node| match node {
            FieldNode::Group(entries) => {
                let mut next = entries.to_vec();
                next.push(entry);
                index = next.len() - 1;
                Ok(FieldNode::Group(Arc::new(next)))
            }
            FieldNode::Leaf(_) => Err(FormError::NotAGroup(group.to_string())),
        })?;
        self.mark_dirty();
        debug!(group = %self.scope.path_to(group), index, "subform added");
        Ok(index)
    }

    /// Remove entry `index` from `group`; later entries move up by one.
    ///
    /// Pending checks of the removed entry and of every entry after it are
    /// cancelled. Earlier entries keep theirs.
    pub fn remove_subform(&self, group: &str, index: usize) -> Result<()> {
        self.schema()?.require_group(group)?;
        self.form.set_field(&self.scope, group, |node| match node {
            FieldNode::Group(entries) if index < entries.len() => {
                let mut next = entries.to_vec();
                next.remove(index);
                Ok(FieldNode::Group(Arc::new(next)))
            }
            FieldNode::Group(entries) => Err(FormError::IndexOutOfBounds {
                group: group.to_string(),
                index,
                len: entries.len(),
            }),
            FieldNode::Leaf(_) => Err(FormError::NotAGroup(group.to_string())),
        })?;

        let group_path = self.scope.path_to(group).to_string();
        let dropped = self.form.scheduler().cancel_entries_from(&group_path, index);
        if dropped > 0 {
            debug!(group = %group_path, dropped, "pending validations cancelled after removal");
        }
        self.mark_dirty();
        debug!(group = %group_path, index, "subform removed");
        Ok(())
    }

    /// View bound to entry `index` of `group`.
    pub fn sub_state(&self, group: &str, index: usize) -> Result<FormBinding> {
        self.schema()?.require_group(group)?;
        let len = self.group_len(group)?;
        if index >= len {
            return Err(FormError::IndexOutOfBounds {
                group: group.to_string(),
                index,
                len,
            });
        }
        Ok(FormBinding {
            form: self.form.clone(),
            scope: self.scope.child(group, index),
        })
    }

    /// One view per current entry of `group`, in order.
    pub fn sub_states(&self, group: &str) -> Result<Vec<FormBinding>> {
        self.schema()?.require_group(group)?;
        let len = self.group_len(group)?;
        (0..len).map(|index| self.sub_state(group, index)).collect()
    }

    fn group_len(&self, group: &str) -> Result<usize> {
        let fields = self.fields()?;
        fields
            .group(group)
            .map(<[_]>::len)
            .ok_or_else(|| FormError::NotAGroup(group.to_string()))
    }

    /// Remove the entry this view is bound to from its parent group.
    pub fn remove(&self) -> Result<()> {
        let step = self.scope.last().ok_or(FormError::UnboundScope)?;
        let parent = FormBinding {
            form: self.form.clone(),
            scope: self.scope.parent().ok_or(FormError::UnboundScope)?,
        };
        parent.remove_subform(&step.group, step.index)
    }
}
