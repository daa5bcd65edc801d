//! Structural edits a form renderer applies to a value of a known schema.
//!
//! Each operation works on the `serde_json::Value` at the edited position and
//! fails with [`EditError`] when that value does not have the shape the
//! operation expects. Key order is preserved everywhere (`preserve_order`).

use serde_json::{Map, Number, Value};

use crate::defaults::{default_for, default_for_branch};
use crate::error::{EditError, kind_desc};
use crate::ir::{FieldKind, FieldSchema};

fn as_array(value: &mut Value) -> Result<&mut Vec<Value>, EditError> {
    let found = kind_desc(value);
    value.as_array_mut().ok_or(EditError::ShapeMismatch { expected: "array", found })
}

fn as_object(value: &mut Value) -> Result<&mut Map<String, Value>, EditError> {
    let found = kind_desc(value);
    value.as_object_mut().ok_or(EditError::ShapeMismatch { expected: "object", found })
}

// ————————————————————————————————————————————————————————————————————————————
// ARRAYS
// ————————————————————————————————————————————————————————————————————————————

/// Append a default item; returns its index.
pub fn push_item(array: &mut Value, item_type: &FieldSchema) -> Result<usize, EditError> {
    let items = as_array(array)?;
    items.push(default_for(item_type));
    Ok(items.len() - 1)
}

pub fn remove_item(array: &mut Value, index: usize) -> Result<Value, EditError> {
    let items = as_array(array)?;
    if index >= items.len() {
        return Err(EditError::IndexOutOfBounds { index, len: items.len() });
    }
    Ok(items.remove(index))
}

// ————————————————————————————————————————————————————————————————————————————
// RECORDS
// ————————————————————————————————————————————————————————————————————————————

/// Insert `key_{n+1}` (bumped past existing keys) mapped to a default value.
pub fn add_record_entry(record: &mut Value, item_type: &FieldSchema) -> Result<String, EditError> {
    let entries = as_object(record)?;
    let mut n = entries.len() + 1;
    let mut key = format!("key_{n}");
    while entries.contains_key(&key) {
        n += 1;
        key = format!("key_{n}");
    }
    entries.insert(key.clone(), default_for(item_type));
    Ok(key)
}

/// Rename an entry in place; its position among the other keys is kept.
pub fn rename_record_key(record: &mut Value, from: &str, to: &str) -> Result<(), EditError> {
    let entries = as_object(record)?;
    if from == to {
        return if entries.contains_key(from) { Ok(()) } else { Err(EditError::MissingKey(from.to_string())) };
    }
    if !entries.contains_key(from) {
        return Err(EditError::MissingKey(from.to_string()));
    }
    if entries.contains_key(to) {
        return Err(EditError::KeyExists(to.to_string()));
    }
    *entries = std::mem::take(entries)
        .into_iter()
        .map(|(k, v)| if k == from { (to.to_string(), v) } else { (k, v) })
        .collect();
    Ok(())
}

pub fn remove_record_entry(record: &mut Value, key: &str) -> Result<Value, EditError> {
    as_object(record)?
        .shift_remove(key)
        .ok_or_else(|| EditError::MissingKey(key.to_string()))
}

// ————————————————————————————————————————————————————————————————————————————
// OBJECTS
// ————————————————————————————————————————————————————————————————————————————

/// Set or clear an optional field of an object value. A field that becomes
/// present takes its default and lands at its schema position.
pub fn set_optional(
    object: &mut Value,
    schema: &FieldSchema,
    field: &str,
    present: bool,
) -> Result<(), EditError> {
    let fields = schema
        .fields()
        .ok_or(EditError::ShapeMismatch { expected: "object", found: schema.kind.tag() })?;
    let target = fields
        .iter()
        .find(|f| f.name == field)
        .ok_or_else(|| EditError::UnknownField(field.to_string()))?;
    let entries = as_object(object)?;

    if !present {
        entries.shift_remove(field);
        return Ok(());
    }
    if entries.contains_key(field) {
        return Ok(());
    }
    let mut old = std::mem::take(entries);
    for f in fields {
        if f.name == field {
            entries.insert(f.name.clone(), default_for(target));
        } else if let Some(v) = old.shift_remove(&f.name) {
            entries.insert(f.name.clone(), v);
        }
    }
    // keys the schema does not know about stay at the end
    entries.extend(old);
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// UNIONS
// ————————————————————————————————————————————————————————————————————————————

/// Index of the branch the current value belongs to, if any.
pub fn active_branch(value: &Value, branches: &[FieldSchema]) -> Option<usize> {
    branches.iter().position(|b| match (&b.kind, value) {
        (FieldKind::Object { .. }, Value::Object(_)) => true,
        (FieldKind::Number, Value::Number(_)) => true,
        (FieldKind::Boolean, Value::Bool(_)) => true,
        (FieldKind::String, Value::String(_)) => true,
        (FieldKind::Enum { values }, Value::String(s)) => values.contains(s),
        (FieldKind::Array { .. }, Value::Array(_)) => true,
        (FieldKind::Record { .. }, Value::Object(_)) => true,
        _ => false,
    })
}

/// Value after switching a union to `branch`. Numbers and booleans are
/// coerced from the current value; other branches start fresh.
pub fn switch_union_branch(current: &Value, branch: &FieldSchema) -> Value {
    match &branch.kind {
        FieldKind::Number => Value::Number(coerce_number(current)),
        FieldKind::Boolean => Value::Bool(truthy(current)),
        _ => default_for_branch(branch),
    }
}

fn coerce_number(value: &Value) -> Number {
    let f = match value {
        Value::Number(n) => return n.clone(),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Number::from(f as i64)
    } else {
        Number::from_f64(f).unwrap_or_else(|| Number::from(0))
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
