//! Error model: reading, synthesizing and attaching field errors.
//!
//! All functions are pure. The `mark_*` / `apply_*` helpers return a new tree
//! and leave every node they do not touch shared with the input.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::path::FieldPath;
use crate::schema::{Schema, SchemaNode};
use crate::tree::{FieldNode, FormTree, Leaf};

/// `true` for values a required field treats as missing: `null`, `false`,
/// numeric zero and the empty string.
///
/// Zero and `false` count as missing too, so a required field cannot hold them.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Whether any leaf, at any depth, carries an error.
pub fn has_errors(tree: &FormTree) -> bool {
    tree.iter().any(|(_, node)| match node {
        FieldNode::Leaf(leaf) => leaf.error.is_some(),
        FieldNode::Group(entries) => entries.iter().any(|entry| has_errors(entry)),
    })
}

fn is_missing(schema: &Schema, name: &str, leaf: &Leaf) -> bool {
    schema
        .field_config(name)
        .is_some_and(|config| config.is_required() && is_falsy(&leaf.value))
}

/// Whether any required scalar field, at any depth, holds a falsy value.
pub fn has_missing_required(tree: &FormTree, schema: &Schema) -> bool {
    tree.iter().any(|(name, node)| match node {
        FieldNode::Leaf(leaf) => is_missing(schema, name, leaf),
        FieldNode::Group(entries) => schema
            .group_schema(name)
            .is_some_and(|nested| entries.iter().any(|e| has_missing_required(e, nested))),
    })
}

/// Set `message` on every required field that is missing a value.
///
/// Other errors are left as they are. Group entries are always rebuilt.
pub fn mark_missing_required(tree: &FormTree, schema: &Schema, message: &str) -> FormTree {
    let mut next = tree.clone();
    for (name, node) in schema.iter() {
        let replacement = match (node, tree.get(name)) {
            (SchemaNode::Scalar(_), Some(FieldNode::Leaf(leaf))) => {
                if !is_missing(schema, name, leaf) {
                    continue;
                }
                FieldNode::Leaf(Arc::new(leaf.with_error(Some(message.to_string()))))
            }
            (SchemaNode::Group(nested), Some(FieldNode::Group(entries))) => FieldNode::Group(
                Arc::new(
                    entries
                        .iter()
                        .map(|entry| Arc::new(mark_missing_required(entry, nested, message)))
                        .collect(),
                ),
            ),
            _ => continue,
        };
        next = next.with_node(name, replacement);
    }
    next
}

/// Attach server-side messages addressed by dotted path.
///
/// Entries are applied one after the other, each on the result of the
/// previous one, so several errors below the same group all survive. Paths
/// that do not name a leaf are skipped.
pub fn apply_errors_by_path<I, P, M>(tree: &FormTree, errors: I) -> FormTree
where
    I: IntoIterator<Item = (P, M)>,
    P: Into<FieldPath>,
    M: Into<String>,
{
    errors.into_iter().fold(tree.clone(), |current, (path, message)| {
        let path = path.into();
        match set_error_at(&current, path.segments(), message.into()) {
            Some(next) => {
                debug!(path = %path, "field error applied");
                next
            }
            None => {
                warn!(path = %path, "error path does not resolve to a field; skipped");
                current
            }
        }
    })
}

fn set_error_at(tree: &FormTree, segments: &[String], message: String) -> Option<FormTree> {
    let (name, rest) = segments.split_first()?;
    let replacement = match (tree.get(name)?, rest) {
        (FieldNode::Leaf(leaf), []) => FieldNode::Leaf(Arc::new(leaf.with_error(Some(message)))),
        (FieldNode::Group(entries), [index, rest @ ..]) => {
            let index = index.parse::<usize>().ok()?;
            let updated = set_error_at(entries.get(index)?, rest, message)?;
            let mut next = entries.to_vec();
            next[index] = Arc::new(updated);
            FieldNode::Group(Arc::new(next))
        }
        _ => return None,
    };
    Some(tree.with_node(name, replacement))
}
