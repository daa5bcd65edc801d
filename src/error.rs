//! Failures surfaced by a parse/compile call.
//!
//! Every variant is terminal for the call that produced it: there are no
//! partial schemas. Unknown names that the active policy tolerates never reach
//! this type; they degrade to `string` inside the compiler.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Scanning produced zero declarations (also covers empty input).
    #[error("no declarations found")]
    NoDeclarationsFound,

    #[error("{0} not found")]
    RootNotFound(String),

    /// A `Record<...>` expression without a recoverable value type.
    #[error("malformed record type `{expr}`: expected `Record<KeyType, ValueType>`")]
    MalformedRecord { expr: String },

    /// Only raised under `UnknownTypePolicy::Reject`.
    #[error("unknown type `{name}` in {context}")]
    UnknownType { name: String, context: String },

    /// Only raised under `DuplicatePolicy::Reject`.
    #[error("declaration `{0}` is declared more than once")]
    DuplicateDeclaration(String),

    #[error("cyclic type reference: {}", path.join(" -> "))]
    CyclicTypeReference { path: Vec<String> },
}

/// Shape mismatches when editing a JSON value against its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("expected {expected}, found {found}")]
    ShapeMismatch { expected: &'static str, found: &'static str },

    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("key `{0}` does not exist")]
    MissingKey(String),

    #[error("key `{0}` already exists")]
    KeyExists(String),

    #[error("`{0}` is not a field of this object")]
    UnknownField(String),
}

pub(crate) fn kind_desc(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
