//! Schema compiler: classified declarations → `FieldSchema` tree.
//!
//! Resolution is by name against the complete declaration map, so the order
//! of declarations in the source text never matters. Declarations are
//! expanded eagerly into a tree; a declaration reached again while it is
//! still being expanded is a cycle and fails the whole compile.

use indexmap::IndexMap;
use tracing::{instrument, warn};

use crate::classify::{Branch, DeclBody, Declaration, Member, Shape, classify_type};
use crate::error::ParseError;
use crate::ir::{FieldKind, FieldSchema, Primitive};
use crate::options::{ArrayPrimitivePolicy, CompileOptions, UnknownTypePolicy};

/// Where a type expression sits; fallbacks differ per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Field,
    ArrayItem,
    RecordValue,
    UnionBranch,
}

struct Compiler<'a> {
    decls: &'a IndexMap<String, Declaration>,
    options: &'a CompileOptions,
    /// Declarations currently being expanded, outermost first.
    stack: Vec<String>,
    /// Member being compiled, for error context.
    member: String,
}

/// Compile the declaration named `root`.
///
/// A block root yields one schema per member, in member order. A direct-alias
/// root (`type Root = Foo[]`) yields exactly one nameless schema describing the
/// whole value.
#[instrument(level = "debug", skip_all, fields(root = %root))]
pub fn compile(
    decls: &IndexMap<String, Declaration>,
    root: &str,
    options: &CompileOptions,
) -> Result<Vec<FieldSchema>, ParseError> {
    let decl = decls
        .get(root)
        .ok_or_else(|| ParseError::RootNotFound(root.to_string()))?;
    let mut cx = Compiler {
        decls,
        options,
        stack: vec![decl.name.clone()],
        member: String::new(),
    };
    match &decl.body {
        DeclBody::Members(members) => members.iter().map(|m| cx.member(m)).collect(),
        DeclBody::Alias(member) => Ok(vec![cx.member(member)?]),
    }
}

impl Compiler<'_> {
    fn member(&mut self, m: &Member) -> Result<FieldSchema, ParseError> {
        let outer = std::mem::replace(&mut self.member, m.name.clone());
        let kind = self.shape(&m.shape, Position::Field);
        self.member = outer;
        Ok(FieldSchema::named(m.name.clone(), kind?)
            .with_optional(m.optional)
            .with_description(m.description.clone()))
    }

    fn shape(&mut self, shape: &Shape, pos: Position) -> Result<FieldKind, ParseError> {
        match shape {
            Shape::Enum(values) => Ok(FieldKind::Enum { values: values.clone() }),
            Shape::Union(branches) => {
                let branches = branches
                    .iter()
                    .map(|b| self.branch(b).map(FieldSchema::anonymous))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldKind::Union { branches })
            }
            Shape::Record { value_type, .. } => {
                let item = self.expr(value_type, Position::RecordValue)?;
                Ok(FieldKind::Record { item_type: Box::new(FieldSchema::anonymous(item)) })
            }
            Shape::Array(elem) => {
                let item = self.expr(elem, Position::ArrayItem)?;
                Ok(FieldKind::Array { item_type: Box::new(FieldSchema::anonymous(item)) })
            }
            Shape::Named(name) => self.named(name, pos),
        }
    }

    fn branch(&mut self, branch: &Branch) -> Result<FieldKind, ParseError> {
        match branch {
            Branch::Primitive(p) => Ok((*p).into()),
            Branch::Literal(lit) => Ok(FieldKind::Enum { values: vec![lit.clone()] }),
            Branch::Interface(expr) => self.expr(expr, Position::UnionBranch),
        }
    }

    /// Element / value / branch expressions are classified on demand.
    fn expr(&mut self, expr: &str, pos: Position) -> Result<FieldKind, ParseError> {
        match classify_type(expr)? {
            Shape::Named(name) => self.named(&name, pos),
            shape => self.shape(&shape, pos),
        }
    }

    fn named(&mut self, name: &str, pos: Position) -> Result<FieldKind, ParseError> {
        if let Some(p) = Primitive::from_name(name) {
            let lossy = pos == Position::ArrayItem
                && self.options.array_primitives == ArrayPrimitivePolicy::AsString;
            return Ok(if lossy { FieldKind::String } else { p.into() });
        }
        let decls = self.decls;
        match decls.get(name) {
            Some(decl) => self.expand(decl, pos),
            None => self.unknown(name, pos),
        }
    }

    fn expand(&mut self, decl: &Declaration, pos: Position) -> Result<FieldKind, ParseError> {
        if let Some(at) = self.stack.iter().position(|n| *n == decl.name) {
            let mut path = self.stack[at..].to_vec();
            path.push(decl.name.clone());
            return Err(ParseError::CyclicTypeReference { path });
        }
        self.stack.push(decl.name.clone());
        let out = match &decl.body {
            DeclBody::Members(members) => members
                .iter()
                .map(|m| self.member(m))
                .collect::<Result<Vec<_>, _>>()
                .map(|fields| FieldKind::Object { fields }),
            // the alias target takes the referencing member's name and position
            DeclBody::Alias(target) => self.shape(&target.shape, pos),
        };
        self.stack.pop();
        out
    }

    fn unknown(&self, name: &str, pos: Position) -> Result<FieldKind, ParseError> {
        let context = self.context();
        match self.options.unknown_types {
            UnknownTypePolicy::Reject => Err(ParseError::UnknownType {
                name: name.to_string(),
                context,
            }),
            UnknownTypePolicy::AsString => {
                if name.starts_with('{') {
                    warn!(%context, ?pos, "inline object types are not supported, falling back");
                } else {
                    warn!(ty = name, %context, ?pos, "unknown type, falling back");
                }
                Ok(match pos {
                    Position::RecordValue => FieldKind::Object { fields: Vec::new() },
                    _ => FieldKind::String,
                })
            }
        }
    }

    fn context(&self) -> String {
        let decl = self.stack.last().map(String::as_str).unwrap_or_default();
        if self.member.is_empty() {
            format!("`{decl}`")
        } else {
            format!("`{decl}.{}`", self.member)
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_declarations;
    use crate::scan::scan;

    fn compile_src(src: &str, root: &str, options: &CompileOptions) -> Result<Vec<FieldSchema>, ParseError> {
        let decls = classify_declarations(&scan(src)?)?;
        compile(&decls, root, options)
    }

    fn ok(src: &str, root: &str) -> Vec<FieldSchema> {
        compile_src(src, root, &CompileOptions::default()).unwrap()
    }

    fn string() -> FieldKind {
        FieldKind::String
    }

    #[test]
    fn primitives_keep_order_and_optionality() {
        let fields = ok("interface Root {\n  b: boolean;\n  a?: string;\n  n: number;\n  x: Mystery;\n}", "Root");
        let summary: Vec<_> = fields.iter().map(|f| (f.name.as_str(), f.kind.tag(), f.optional)).collect();
        assert_eq!(
            summary,
            vec![
                ("b", "boolean", false),
                ("a", "string", true),
                ("n", "number", false),
                ("x", "string", false),
            ]
        );
    }

    #[test]
    fn citation_scenario() {
        let fields = ok(
            "interface Citation { a: string; b: number; } interface Root { items: Citation[]; flag?: boolean; }",
            "Root",
        );
        let expected = vec![
            FieldSchema::named(
                "items",
                FieldKind::Array {
                    item_type: Box::new(FieldSchema::anonymous(FieldKind::Object {
                        fields: vec![
                            FieldSchema::named("a", FieldKind::String),
                            FieldSchema::named("b", FieldKind::Number),
                        ],
                    })),
                },
            ),
            FieldSchema::named("flag", FieldKind::Boolean).with_optional(true),
        ];
        assert_eq!(fields, expected);
    }

    #[test]
    fn forward_references_resolve() {
        let fields = ok("interface Root { child: Child }\ninterface Child { x: number }", "Root");
        assert_eq!(
            fields[0].kind,
            FieldKind::Object { fields: vec![FieldSchema::named("x", FieldKind::Number)] }
        );
    }

    #[test]
    fn enums_keep_source_order() {
        let fields = ok(r#"interface Root { mode: "c" | "a" | "b" }"#, "Root");
        assert_eq!(
            fields[0].kind,
            FieldKind::Enum { values: vec!["c".into(), "a".into(), "b".into()] }
        );
    }

    #[test]
    fn records_of_primitives_and_declarations() {
        let fields = ok(
            "interface Root {\n  counts: Record<string, number>;\n  tips: Record<string, Tip>;\n  lost: Record<string, Nope>;\n}\ninterface Tip { label: string }",
            "Root",
        );
        assert_eq!(fields[0].item_type().unwrap().kind, FieldKind::Number);
        assert_eq!(
            fields[1].item_type().unwrap().kind,
            FieldKind::Object { fields: vec![FieldSchema::named("label", string())] }
        );
        // unresolved record values degrade to an empty object
        assert_eq!(fields[2].item_type().unwrap().kind, FieldKind::Object { fields: vec![] });
    }

    #[test]
    fn array_primitive_policy() {
        let src = "interface Root { ns: number[]; bs: boolean[]; ss: string[] }";
        let lossy = ok(src, "Root");
        assert!(lossy.iter().all(|f| f.item_type().unwrap().kind == FieldKind::String));

        let options = CompileOptions {
            array_primitives: ArrayPrimitivePolicy::Preserve,
            ..CompileOptions::default()
        };
        let kept = compile_src(src, "Root", &options).unwrap();
        let items: Vec<_> = kept.iter().map(|f| f.item_type().unwrap().kind.tag()).collect();
        assert_eq!(items, vec!["number", "boolean", "string"]);
    }

    #[test]
    fn nested_arrays_and_records_recurse() {
        let fields = ok("interface Root { grid: Cell[][]; m: Record<string, Cell[]> }\ninterface Cell { v: number }", "Root");
        let inner = fields[0].item_type().unwrap().item_type().unwrap();
        assert_eq!(inner.fields().unwrap()[0].name, "v");
        let rec_item = fields[1].item_type().unwrap();
        assert_eq!(rec_item.kind.tag(), "array");
        assert_eq!(rec_item.item_type().unwrap().fields().unwrap().len(), 1);
    }

    #[test]
    fn unions_compile_each_branch() {
        let fields = ok(
            "interface Root { v: Point | number | \"none\" }\ninterface Point { x: number; y: number }",
            "Root",
        );
        let FieldKind::Union { branches } = &fields[0].kind else { panic!("union expected") };
        assert_eq!(branches.len(), 3);
        assert!(branches.iter().all(FieldSchema::is_anonymous));
        assert_eq!(branches[0].fields().unwrap().len(), 2);
        assert_eq!(branches[1].kind, FieldKind::Number);
        assert_eq!(branches[2].kind, FieldKind::Enum { values: vec!["none".into()] });
    }

    #[test]
    fn alias_references_take_the_member_name() {
        let fields = ok(
            "type Mode = \"on\" | \"off\"\ninterface Root {\n  mode?: Mode; // current mode\n  modes: Mode[];\n}",
            "Root",
        );
        assert_eq!(fields[0].name, "mode");
        assert!(fields[0].optional);
        assert_eq!(fields[0].description.as_deref(), Some("current mode"));
        assert_eq!(fields[0].kind, FieldKind::Enum { values: vec!["on".into(), "off".into()] });
        assert_eq!(fields[1].item_type().unwrap().kind.tag(), "enum");
    }

    #[test]
    fn aliases_inside_arrays_follow_the_array_policy() {
        let src = "type Id = number\ninterface Root { id: Id; ids: Id[] }";
        let lossy = ok(src, "Root");
        assert_eq!(lossy[0].kind, FieldKind::Number);
        assert_eq!(lossy[1].item_type().unwrap().kind, FieldKind::String);

        let options = CompileOptions {
            array_primitives: ArrayPrimitivePolicy::Preserve,
            ..CompileOptions::default()
        };
        let kept = compile_src(src, "Root", &options).unwrap();
        assert_eq!(kept[1].item_type().unwrap().kind, FieldKind::Number);
    }

    #[test]
    fn inline_object_record_values_follow_the_unknown_type_policy() {
        let src = "interface Root { meta: Record<string, { a: string; b: number }>; n: number }";
        let fields = ok(src, "Root");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].item_type().unwrap().kind, FieldKind::Object { fields: vec![] });
        assert_eq!(fields[1].kind, FieldKind::Number);

        let options = CompileOptions { unknown_types: UnknownTypePolicy::Reject, ..CompileOptions::default() };
        let err = compile_src(src, "Root", &options).unwrap_err();
        assert!(matches!(err, ParseError::UnknownType { ref context, .. } if context == "`Root.meta`"));
    }

    #[test]
    fn arrays_of_records_recurse() {
        let fields = ok("interface Root { rows: Record<string, number>[]; tips?: Record<string, Tip>[] }\ninterface Tip { label: string }", "Root");
        let row = fields[0].item_type().unwrap();
        assert_eq!(row.kind.tag(), "record");
        assert_eq!(row.item_type().unwrap().kind, FieldKind::Number);
        let tip = fields[1].item_type().unwrap().item_type().unwrap();
        assert_eq!(tip.fields().unwrap()[0].name, "label");
    }

    #[test]
    fn direct_alias_roots_are_singletons() {
        let src = "interface Item { id: string }\ntype Items = Item[]\ntype ById = Record<string, Item>\ntype One = Item";
        for (root, tag) in [("Items", "array"), ("ById", "record"), ("One", "object")] {
            let roots = ok(src, root);
            assert_eq!(roots.len(), 1, "{root}");
            assert!(roots[0].is_anonymous());
            assert_eq!(roots[0].kind.tag(), tag);
        }
    }

    #[test]
    fn missing_root_fails() {
        let err = compile_src("interface A { a: string }", "ChatState", &CompileOptions::default()).unwrap_err();
        assert_eq!(err, ParseError::RootNotFound("ChatState".into()));
        assert_eq!(err.to_string(), "ChatState not found");
    }

    #[test]
    fn cycles_are_rejected_with_path() {
        let src = "interface Root { a: A[] }\ninterface A { b: B[] }\ninterface B { a: A[] }";
        let err = compile_src(src, "Root", &CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ParseError::CyclicTypeReference { path: vec!["A".into(), "B".into(), "A".into()] }
        );
        let self_ref = compile_src("interface Node { children: Node[] }", "Node", &CompileOptions::default());
        assert!(matches!(self_ref, Err(ParseError::CyclicTypeReference { .. })));
    }

    #[test]
    fn shared_declarations_are_not_cycles() {
        let src = "interface Root { a: Leaf; b: Leaf[]; c: Record<string, Leaf> }\ninterface Leaf { x: string }";
        assert_eq!(ok(src, "Root").len(), 3);
    }

    #[test]
    fn reject_policy_reports_context() {
        let options = CompileOptions { unknown_types: UnknownTypePolicy::Reject, ..CompileOptions::default() };
        let err = compile_src("interface Root { inner: Inner }\ninterface Inner { x: Mystery[] }", "Root", &options).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownType { name: "Mystery".into(), context: "`Inner.x`".into() }
        );
        let err = compile_src("interface Root { r: Record<string, Gone> }", "Root", &options).unwrap_err();
        assert!(matches!(err, ParseError::UnknownType { ref name, .. } if name == "Gone"));
    }
}
