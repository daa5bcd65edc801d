// Renderer-facing schema tree. Built once by the compiler, never mutated after.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Number,
    Boolean,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// One value position: a named object field, or a nameless array item,
/// record value, union branch or direct-alias root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "isOptional", skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Enum {
        #[serde(rename = "enumValues")]
        values: Vec<String>,
    },
    Union {
        #[serde(rename = "unionTypes")]
        branches: Vec<FieldSchema>,
    },
    Object {
        fields: Vec<FieldSchema>,     // source member order
    },
    Array {
        #[serde(rename = "itemType")]
        item_type: Box<FieldSchema>,
    },
    Record {
        #[serde(rename = "itemType")]
        item_type: Box<FieldSchema>,  // keys are free-form strings
    },
}

impl From<Primitive> for FieldKind {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::String => FieldKind::String,
            Primitive::Number => FieldKind::Number,
            Primitive::Boolean => FieldKind::Boolean,
        }
    }
}

impl FieldKind {
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            FieldKind::String => Some(Primitive::String),
            FieldKind::Number => Some(Primitive::Number),
            FieldKind::Boolean => Some(Primitive::Boolean),
            _ => None,
        }
    }
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Enum { .. } => "enum",
            FieldKind::Union { .. } => "union",
            FieldKind::Object { .. } => "object",
            FieldKind::Array { .. } => "array",
            FieldKind::Record { .. } => "record",
        }
    }
}

impl FieldSchema {
    /// A nameless, required node.
    pub fn anonymous(kind: FieldKind) -> Self {
        Self { name: String::new(), optional: false, description: None, kind }
    }
    pub fn named(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), optional: false, description: None, kind }
    }
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
    /// Child fields when this node is an object.
    pub fn fields(&self) -> Option<&[FieldSchema]> {
        match &self.kind {
            FieldKind::Object { fields } => Some(fields),
            _ => None,
        }
    }
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields()?.iter().find(|f| f.name == name)
    }
    /// Item schema for arrays and records.
    pub fn item_type(&self) -> Option<&FieldSchema> {
        match &self.kind {
            FieldKind::Array { item_type } | FieldKind::Record { item_type } => Some(item_type),
            _ => None,
        }
    }
}

/// The renderer treats a single nameless root as "the schema of the whole
/// value" instead of one field of an outer object.
pub fn is_direct_root(roots: &[FieldSchema]) -> bool {
    roots.len() == 1 && roots[0].is_anonymous()
}
