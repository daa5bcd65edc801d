//! Minimal valid JSON for a schema node.
//!
//! Containers start empty (items are added on demand by the editor) and
//! optional object fields are left out: absence, not `null`, means "not set".

use serde_json::{Map, Value};

use crate::ir::{FieldKind, FieldSchema, is_direct_root};

pub fn default_for(schema: &FieldSchema) -> Value {
    match &schema.kind {
        FieldKind::String => Value::from(""),
        FieldKind::Number => Value::from(0),
        FieldKind::Boolean => Value::Bool(false),
        FieldKind::Enum { values } => Value::from(values.first().cloned().unwrap_or_default()),
        FieldKind::Array { .. } => Value::Array(Vec::new()),
        FieldKind::Record { .. } => Value::Object(Map::new()),
        FieldKind::Object { fields } => Value::Object(required_defaults(fields)),
        // the renderer picks the initial branch
        FieldKind::Union { .. } => Value::Null,
    }
}

/// Value a union takes when `branch` becomes active with nothing carried over.
pub fn default_for_branch(branch: &FieldSchema) -> Value {
    match &branch.kind {
        FieldKind::Object { .. } => Value::Object(Map::new()),
        FieldKind::Number => Value::from(0),
        FieldKind::Boolean => Value::Bool(false),
        FieldKind::Enum { values } => Value::from(values.first().cloned().unwrap_or_default()),
        _ => Value::from(""),
    }
}

/// Initial document for a compile result: the value itself for a nameless
/// direct-alias root, otherwise an object of the required root fields.
pub fn default_document(roots: &[FieldSchema]) -> Value {
    if is_direct_root(roots) {
        return default_for(&roots[0]);
    }
    Value::Object(required_defaults(roots))
}

fn required_defaults(fields: &[FieldSchema]) -> Map<String, Value> {
    fields
        .iter()
        .filter(|f| !f.optional)
        .map(|f| (f.name.clone(), default_for(f)))
        .collect()
}
