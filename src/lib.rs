//! Interface declarations → form schema.
//!
//! Reads a block of TypeScript-style `interface` / `type` declarations,
//! compiles a designated root declaration into a [`FieldSchema`] tree for a
//! form renderer, and synthesizes default JSON values for any node of it.
//!
//! ```text
//! text ─scan─▶ DeclSource map ─classify─▶ Declaration map ─compile(root)─▶ Vec<FieldSchema>
//!                                                                 └─default_for─▶ serde_json::Value
//! ```
//!
//! Every call is independent and all-or-nothing: an error means no schema.
pub mod classify;
pub mod compile;
pub mod defaults;
pub mod edit;
pub mod error;
pub mod ir;
pub mod options;
pub mod scan;

use indexmap::IndexMap;

pub use classify::{Declaration, DeclBody, Member, Shape};
pub use compile::compile;
pub use defaults::{default_document, default_for, default_for_branch};
pub use error::{EditError, ParseError};
pub use ir::{FieldKind, FieldSchema, Primitive, is_direct_root};
pub use options::{ArrayPrimitivePolicy, CompileOptions, DuplicatePolicy, UnknownTypePolicy};

/// Scan and classify every declaration in `text`.
pub fn declarations(
    text: &str,
    options: &CompileOptions,
) -> Result<IndexMap<String, Declaration>, ParseError> {
    let sources = scan::scan_with(text, options.duplicates)?;
    classify::classify_declarations(&sources)
}

/// Scan, classify and compile `root` in one go.
pub fn parse(
    text: &str,
    root: &str,
    options: &CompileOptions,
) -> Result<Vec<FieldSchema>, ParseError> {
    let decls = declarations(text, options)?;
    compile(&decls, root, options)
}
