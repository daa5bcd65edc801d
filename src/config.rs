use confique::Config as DeriveConfig;
use form_schema::{ArrayPrimitivePolicy, CompileOptions, DuplicatePolicy, UnknownTypePolicy};

#[derive(Debug, DeriveConfig)]
pub struct Config {
    /// Name of the declaration the schema is compiled from.
    #[config(default = "Root")]
    pub root: String,

    /// `as-string` degrades unknown type names to strings, `reject` fails the parse.
    #[config(default = "as-string")]
    pub unknown_types: UnknownTypePolicy,

    /// `as-string` compiles `number[]` / `boolean[]` items as strings (legacy
    /// form builder behavior), `preserve` keeps their type.
    #[config(default = "as-string")]
    pub array_primitives: ArrayPrimitivePolicy,

    /// `last-wins` or `reject` for declarations with the same name.
    #[config(default = "last-wins")]
    pub duplicates: DuplicatePolicy,
}

impl Config {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            unknown_types: self.unknown_types,
            array_primitives: self.array_primitives,
            duplicates: self.duplicates,
        }
    }
}
