//! Form state tree: the current values and errors of a form.
//!
//! The tree mirrors its [`Schema`](crate::Schema) key for key. Scalar fields
//! hold a [`Leaf`]; repeatable groups hold an ordered list of sub-trees.
//!
//! Snapshots are immutable. Every update goes through a copy-on-write helper
//! that rebuilds only the spine from the root to the touched node, so nodes the
//! update does not reach stay `Arc::ptr_eq` with the previous snapshot.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::{FormError, Result};
use crate::path::{FieldPath, Scope};

/// Current value and error message of one scalar field.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub value: Value,
    pub error: Option<String>,
}

impl Leaf {
    pub fn new(value: Value) -> Self {
        Self { value, error: None }
    }

    pub fn with_value(&self, value: Value) -> Self {
        Self {
            value,
            error: self.error.clone(),
        }
    }

    pub fn with_error(&self, error: Option<String>) -> Self {
        Self {
            value: self.value.clone(),
            error,
        }
    }
}

/// Ordered entries of a repeatable group.
pub type GroupEntries = Arc<Vec<Arc<FormTree>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode {
    Leaf(Arc<Leaf>),
    Group(GroupEntries),
}

impl FieldNode {
    pub fn leaf(value: Value) -> Self {
        FieldNode::Leaf(Arc::new(Leaf::new(value)))
    }

    pub fn group(entries: Vec<FormTree>) -> Self {
        FieldNode::Group(Arc::new(entries.into_iter().map(Arc::new).collect()))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            FieldNode::Leaf(leaf) => Some(leaf),
            FieldNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&[Arc<FormTree>]> {
        match self {
            FieldNode::Group(entries) => Some(entries.as_slice()),
            FieldNode::Leaf(_) => None,
        }
    }
}

/// One form (or one group entry): field name to node, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormTree {
    fields: IndexMap<String, FieldNode>,
}

impl FormTree {
    pub(crate) fn from_fields(fields: IndexMap<String, FieldNode>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldNode)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn get(&self, name: &str) -> Option<&FieldNode> {
        self.fields.get(name)
    }

    pub fn leaf(&self, name: &str) -> Option<&Leaf> {
        self.get(name)?.as_leaf()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.leaf(name).map(|leaf| &leaf.value)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.leaf(name)?.error.as_deref()
    }

    pub fn group(&self, name: &str) -> Option<&[Arc<FormTree>]> {
        self.get(name)?.as_group()
    }

    pub fn entry(&self, group: &str, index: usize) -> Option<&Arc<FormTree>> {
        self.group(group)?.get(index)
    }

    /// Sub-tree a scope points at (the tree itself for the root scope).
    pub fn scoped(&self, scope: &Scope) -> Option<&FormTree> {
        scope
            .steps()
            .iter()
            .try_fold(self, |tree, step| {
                tree.entry(&step.group, step.index).map(Arc::as_ref)
            })
    }

    /// Resolve a dotted path to the leaf it names.
    pub fn lookup(&self, path: &FieldPath) -> Option<&Leaf> {
        let (name, rest) = path.segments().split_first()?;
        match (self.get(name)?, rest) {
            (FieldNode::Leaf(leaf), []) => Some(leaf),
            (FieldNode::Group(entries), [index, rest @ ..]) => {
                let entry = entries.get(index.parse::<usize>().ok()?)?;
                entry.lookup(&FieldPath::new(rest.to_vec()))
            }
            _ => None,
        }
    }

    /// Copy of this tree with `name` replaced by `node`; every other key keeps
    /// its node.
    pub(crate) fn with_node(&self, name: &str, node: FieldNode) -> FormTree {
        let mut fields = self.fields.clone();
        if let Some(slot) = fields.get_mut(name) {
            *slot = node;
        }
        FormTree { fields }
    }

    /// Replace one key of the sub-tree at `scope` by a transform of its node.
    ///
    /// This is the single mutation primitive the controller and binding layer
    /// build on. The transform sees the current node and returns its
    /// replacement.
    pub(crate) fn update_in<F>(&self, scope: &Scope, name: &str, f: F) -> Result<FormTree>
    where
        F: FnOnce(&FieldNode) -> Result<FieldNode>,
    {
        self.update_steps(scope, 0, name, f)
    }

    fn update_steps<F>(&self, scope: &Scope, depth: usize, name: &str, f: F) -> Result<FormTree>
    where
        F: FnOnce(&FieldNode) -> Result<FieldNode>,
    {
        let Some(step) = scope.steps().get(depth) else {
            let node = self
                .get(name)
                .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
            return Ok(self.with_node(name, f(node)?));
        };

        let entries = match self.get(&step.group) {
            Some(FieldNode::Group(entries)) => entries,
            Some(FieldNode::Leaf(_)) => return Err(FormError::NotAGroup(step.group.clone())),
            None => return Err(FormError::UnknownField(step.group.clone())),
        };
        let entry = entries
            .get(step.index)
            .ok_or_else(|| FormError::IndexOutOfBounds {
                group: step.group.clone(),
                index: step.index,
                len: entries.len(),
            })?;

        let updated = entry.update_steps(scope, depth + 1, name, f)?;
        let mut next = entries.to_vec();
        next[step.index] = Arc::new(updated);
        Ok(self.with_node(&step.group, FieldNode::Group(Arc::new(next))))
    }
}
