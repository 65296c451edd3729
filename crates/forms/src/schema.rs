//! Declarative form schema.
//!
//! A `Schema` maps field names (in declaration order) to either a scalar
//! [`FieldConfig`] or a nested `Schema` describing a repeatable group. The
//! classification is an explicit variant, never inferred from the descriptor.
//!
//! Schemas are immutable once handed to a form; the engine only reads them.
//!
//! Typical usage:
//! ```ignore
//! use forms::{Schema, field_types::{number_field, string_field, FieldOptions}};
//!
//! let schema = Schema::new()
//!     .field("name", string_field(FieldOptions::default().required()))
//!     .group("items", Schema::new().field("qty", number_field(FieldOptions::default())));
//! ```
//!
//! Schemas can also be loaded from a JSON descriptor, see [`Schema::from_value`].

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{FormError, Result};
use crate::field::FieldConfig;
use crate::field_types::{array_of, FieldKind, FieldOptions};
use crate::path::Scope;

/// One entry of a schema.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// A single value with its behaviour descriptor.
    Scalar(FieldConfig),
    /// A repeatable group; every entry conforms to the nested schema.
    Group(Schema),
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: IndexMap<String, SchemaNode>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append (or replace) a scalar field.
    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.nodes.insert(name.into(), SchemaNode::Scalar(config));
        self
    }

    /// Append (or replace) a repeatable group.
    pub fn group(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.nodes.insert(name.into(), SchemaNode::Group(schema));
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn node(&self, name: &str) -> Option<&SchemaNode> {
        self.nodes.get(name)
    }

    /// Scalar field config by name.
    pub fn field_config(&self, name: &str) -> Option<&FieldConfig> {
        match self.nodes.get(name)? {
            SchemaNode::Scalar(config) => Some(config),
            SchemaNode::Group(_) => None,
        }
    }

    /// Nested schema of a repeatable group by name.
    pub fn group_schema(&self, name: &str) -> Option<&Schema> {
        match self.nodes.get(name)? {
            SchemaNode::Group(schema) => Some(schema),
            SchemaNode::Scalar(_) => None,
        }
    }

    /// Schema a sub-form bound to `scope` conforms to.
    pub fn scoped(&self, scope: &Scope) -> Option<&Schema> {
        scope
            .steps()
            .iter()
            .try_fold(self, |schema, step| schema.group_schema(&step.group))
    }

    /// Scalar field config, or the matching error for binding operations.
    pub(crate) fn require_field(&self, name: &str) -> Result<&FieldConfig> {
        match self.nodes.get(name) {
            Some(SchemaNode::Scalar(config)) => Ok(config),
            Some(SchemaNode::Group(_)) => Err(FormError::NotALeaf(name.to_string())),
            None => Err(FormError::UnknownField(name.to_string())),
        }
    }

    /// Group schema, or the matching error for binding operations.
    pub(crate) fn require_group(&self, name: &str) -> Result<&Schema> {
        match self.nodes.get(name) {
            Some(SchemaNode::Group(schema)) => Ok(schema),
            Some(SchemaNode::Scalar(_)) => Err(FormError::NotAGroup(name.to_string())),
            None => Err(FormError::UnknownField(name.to_string())),
        }
    }

    /// Parse a JSON schema descriptor.
    ///
    /// An object with a `"type"` key describes a scalar field built from the
    /// field-type catalog; any other object is a nested group schema.
    ///
    /// ```ignore
    /// let schema = Schema::from_json_str(r#"{
    ///     "name":   { "type": "string", "required": true },
    ///     "amount": { "type": "number", "required": true, "positive": true },
    ///     "items":  { "qty": { "type": "number" } }
    /// }"#)?;
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(FormError::Schema(format!(
                "expected an object of fields, found {value}"
            )));
        };

        let mut schema = Schema::new();
        for (name, node) in entries {
            let Value::Object(body) = node else {
                return Err(FormError::Schema(format!(
                    "field '{name}' must be described by an object"
                )));
            };
            schema = if body.contains_key("type") {
                schema.field(name.clone(), field_from_descriptor(name, node)?)
            } else {
                schema.group(name.clone(), Schema::from_value(node)?)
            };
        }
        Ok(schema)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDescriptor {
    #[serde(rename = "type")]
    kind: FieldKind,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    positive: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    of: Option<Box<FieldDescriptor>>,
}

impl FieldDescriptor {
    fn options(&self) -> FieldOptions {
        FieldOptions {
            required: self.required,
            positive: self.positive,
            default: self.default.clone(),
        }
    }

    fn build(&self) -> FieldConfig {
        match (&self.kind, &self.of) {
            (FieldKind::Array, Some(element)) => array_of(element.build(), &self.options()),
            (kind, _) => kind.build(&self.options()),
        }
    }
}

fn field_from_descriptor(name: &str, node: &Value) -> Result<FieldConfig> {
    let descriptor = FieldDescriptor::deserialize(node)
        .map_err(|e| FormError::Schema(format!("field '{name}': {e}")))?;
    Ok(descriptor.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_types::{number_field, string_field};
    use serde_json::json;

    fn invoice() -> Schema {
        Schema::new()
            .field("name", string_field(FieldOptions::default().required()))
            .group(
                "items",
                Schema::new()
                    .field("qty", number_field(FieldOptions::default()))
                    .group(
                        "parts",
                        Schema::new().field("sku", string_field(FieldOptions::default())),
                    ),
            )
    }

    #[test]
    fn test_lookup_by_kind() {
        let schema = invoice();
        assert_eq!(schema.len(), 2);
        assert!(schema.field_config("name").is_some());
        assert!(schema.field_config("items").is_none());
        assert!(schema.group_schema("items").is_some());
        assert!(matches!(
            schema.require_group("name"),
            Err(FormError::NotAGroup(_))
        ));
        assert!(matches!(
            schema.require_field("missing"),
            Err(FormError::UnknownField(_))
        ));
    }

    #[test]
    fn test_scoped_walks_groups() {
        let schema = invoice();
        let scope = Scope::root().child("items", 3).child("parts", 0);
        let nested = schema.scoped(&scope).unwrap();
        assert!(nested.field_config("sku").is_some());
        assert!(schema.scoped(&Scope::root().child("name", 0)).is_none());
    }

    #[test]
    fn test_order_is_declaration_order() {
        let schema = Schema::new()
            .field("b", string_field(FieldOptions::default()))
            .field("a", string_field(FieldOptions::default()));
        let names: Vec<_> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_from_descriptor() {
        let schema = Schema::from_value(&json!({
            "name": { "type": "string", "required": true },
            "amount": { "type": "number", "required": true, "positive": true },
            "tags": { "type": "array", "of": { "type": "number" } },
            "items": { "qty": { "type": "number", "default": 1 } }
        }))
        .unwrap();

        let names: Vec<_> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "amount", "tags", "items"]);
        assert!(schema.field_config("name").unwrap().is_required());
        assert_eq!(schema.field_config("tags").unwrap().kind(), FieldKind::Array);
        let qty = schema
            .group_schema("items")
            .and_then(|items| items.field_config("qty"))
            .unwrap();
        assert_eq!(qty.default(), &json!(1));
    }

    #[test]
    fn test_from_descriptor_rejects_unknown_type() {
        let err = Schema::from_json_str(r#"{ "color": { "type": "rgb" } }"#).unwrap_err();
        assert!(matches!(err, FormError::Schema(_)));

        let err = Schema::from_json_str(r#"{ "name": "string" }"#).unwrap_err();
        assert!(matches!(err, FormError::Schema(_)));
    }
}
