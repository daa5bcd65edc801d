//! Compile-time policies.
//!
//! `Default` reproduces the tolerant form-builder behavior:
//! unknown names become strings, primitive array items become strings, and a
//! later declaration replaces an earlier one with the same name.

use serde::Deserialize;

/// What to do with a type name that is neither primitive nor declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownTypePolicy {
    /// Degrade to `string` (record values degrade to an empty object).
    #[default]
    AsString,
    /// Fail with `ParseError::UnknownType`.
    Reject,
}

/// How `number[]` / `boolean[]` item types are compiled.
///
/// `AsString` is lossy: an array of numbers gets string items and therefore
/// `""` defaults for new items. Kept as the default until the callers that
/// rely on it are confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayPrimitivePolicy {
    #[default]
    AsString,
    Preserve,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    #[default]
    LastWins,
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub unknown_types: UnknownTypePolicy,
    pub array_primitives: ArrayPrimitivePolicy,
    pub duplicates: DuplicatePolicy,
}

impl CompileOptions {
    /// Every tolerated fallback becomes an error.
    pub fn strict() -> Self {
        Self {
            unknown_types: UnknownTypePolicy::Reject,
            array_primitives: ArrayPrimitivePolicy::Preserve,
            duplicates: DuplicatePolicy::Reject,
        }
    }
}
