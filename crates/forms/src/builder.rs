//! Build a form state tree from a schema and optional initial values.

use indexmap::IndexMap;
use serde_json::Value;

use crate::field::FieldConfig;
use crate::schema::{Schema, SchemaNode};
use crate::tree::{FieldNode, FormTree};

/// Build a fresh tree for `schema`.
///
/// `initial` is expected to be a JSON object keyed like the schema; anything
/// else is treated as "no initial values". For scalar fields a present key
/// (even `null`) wins over the descriptor default, and the load transform runs
/// on whichever value was picked. Repeatable groups get one entry per element
/// of a non-empty array and exactly one blank entry otherwise, so there is
/// always something to render.
pub fn build(schema: &Schema, initial: Option<&Value>) -> FormTree {
    let initial = initial.and_then(Value::as_object);

    let mut fields = IndexMap::with_capacity(schema.len());
    for (name, node) in schema.iter() {
        let seed = initial.and_then(|values| values.get(name));
        let built = match node {
            SchemaNode::Scalar(config) => build_leaf(config, seed),
            SchemaNode::Group(nested) => build_group(nested, seed),
        };
        fields.insert(name.to_string(), built);
    }
    FormTree::from_fields(fields)
}

fn build_leaf(config: &FieldConfig, seed: Option<&Value>) -> FieldNode {
    let value = seed.cloned().unwrap_or_else(|| config.default().clone());
    FieldNode::leaf(config.load(value))
}

fn build_group(schema: &Schema, seed: Option<&Value>) -> FieldNode {
    let entries = match seed {
        Some(Value::Array(items)) if !items.is_empty() => {
            items.iter().map(|item| build(schema, Some(item))).collect()
        }
        _ => vec![build(schema, None)],
    };
    FieldNode::group(entries)
}
