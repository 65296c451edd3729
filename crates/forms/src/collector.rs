//! Project a form state tree back into a plain submission payload.

use serde_json::{Map, Value};
use tracing::warn;

use crate::schema::{Schema, SchemaNode};
use crate::tree::{FieldNode, FormTree};

/// Walk `tree` and produce a JSON object shaped like `schema`.
///
/// Scalar values pass through the field's submit transform; groups become
/// arrays of collected entries. Errors are never read, and the tree is left
/// untouched.
pub fn collect(tree: &FormTree, schema: &Schema) -> Value {
    let mut payload = Map::with_capacity(schema.len());
    for (name, node) in schema.iter() {
        let value = match (node, tree.get(name)) {
            (SchemaNode::Scalar(config), Some(FieldNode::Leaf(leaf))) => {
                config.submit(leaf.value.clone())
            }
            (SchemaNode::Group(nested), Some(FieldNode::Group(entries))) => Value::Array(
                entries
                    .iter()
                    .map(|entry| collect(entry, nested))
                    .collect(),
            ),
            _ => {
                warn!(field = name, "tree does not match schema; field skipped");
                continue;
            }
        };
        payload.insert(name.to_string(), value);
    }
    Value::Object(payload)
}
