//! Member type classifier.
//!
//! Turns one member line (`name?: TypeExpr; // comment`) into a [`Member`]
//! with a [`Shape`]. Bare names stay unresolved here (`Shape::Named`): whether
//! `Foo` is a primitive, a declaration or an unknown name is the compiler's
//! call, once every declaration is known.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::ParseError;
use crate::ir::Primitive;
use crate::scan::DeclSource;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,              // empty for a direct-alias member
    pub optional: bool,
    pub raw_type: String,
    pub description: Option<String>,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Union of quoted literals only; source order, quotes stripped.
    Enum(Vec<String>),
    Union(Vec<Branch>),
    Record { key_type: String, value_type: String },
    /// Element type expression (`Foo` for `Foo[]`).
    Array(String),
    /// Primitive or declaration name; decided at compile time.
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Primitive(Primitive),
    Literal(String),
    /// Anything else; usually a declaration name.
    Interface(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclBody {
    Members(Vec<Member>),
    Alias(Member),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub body: DeclBody,
}

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

/// Classify every scanned declaration. Member lines without a `:` are dropped.
pub fn classify_declarations(
    sources: &IndexMap<String, DeclSource>,
) -> Result<IndexMap<String, Declaration>, ParseError> {
    let mut out = IndexMap::with_capacity(sources.len());
    for (name, src) in sources {
        let body = match &src.alias {
            Some(expr) => DeclBody::Alias(Member {
                name: String::new(),
                optional: false,
                raw_type: expr.trim().to_string(),
                description: None,
                shape: classify_type(expr)?,
            }),
            None => {
                let mut members = Vec::with_capacity(src.members.len());
                for (i, line) in src.members.iter().enumerate() {
                    let Some(mut member) = classify_member(line)? else {
                        trace!(declaration = %name, line, "not a member line");
                        continue;
                    };
                    if member.description.is_none() {
                        member.description = src.docs.get(i).cloned().flatten();
                    }
                    members.push(member);
                }
                DeclBody::Members(members)
            }
        };
        out.insert(name.clone(), Declaration { name: name.clone(), body });
    }
    Ok(out)
}

/// `Ok(None)` for lines that are not `name: type` (methods, stray text).
pub fn classify_member(line: &str) -> Result<Option<Member>, ParseError> {
    let line = line.trim();
    let line = line.strip_prefix("readonly ").unwrap_or(line).trim_start();
    let (code, description) = split_comment(line);

    let Some(colon) = find_top_level(code, ':') else {
        return Ok(None);
    };
    let left = code[..colon].trim();
    if left.is_empty() || left.contains('(') {
        return Ok(None);
    }
    let optional = left.ends_with('?');
    let name = left.trim_end_matches('?').trim();
    let name = unquote(name).unwrap_or_else(|| name.to_string());

    let raw_type = code[colon + 1..]
        .trim()
        .trim_end_matches([';', ','])
        .trim()
        .to_string();
    if raw_type.is_empty() {
        return Ok(None);
    }

    let shape = classify_type(&raw_type)?;
    trace!(%name, optional, %raw_type, ?shape, "member");
    Ok(Some(Member { name, optional, raw_type, description, shape }))
}

/// Classify a type expression. First match wins:
/// literal/union alternatives, `Record<K, V>`, `T[]`, bare name.
pub fn classify_type(expr: &str) -> Result<Shape, ParseError> {
    let expr = strip_parens(expr.trim().trim_end_matches(';').trim());

    let alts: Vec<&str> = split_top_level(expr, '|')
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if alts.len() > 1 || alts.first().is_some_and(|a| unquote(a).is_some()) {
        let literals: Option<Vec<String>> = alts.iter().map(|a| unquote(a)).collect();
        if let Some(values) = literals {
            return Ok(Shape::Enum(values.into_iter().map(|v| v.trim().to_string()).collect()));
        }
        let branches = alts.iter().map(|a| classify_branch(a)).collect();
        return Ok(Shape::Union(branches));
    }

    let expr = alts.first().copied().map(strip_parens).unwrap_or("");

    if let Some(inner) = expr.strip_prefix("Record<") {
        let malformed = || ParseError::MalformedRecord { expr: expr.to_string() };
        let close = closing_angle(inner).ok_or_else(malformed)?;
        // `Record<K, V>[]` and friends fall through to the rules below
        if inner[close + 1..].trim().is_empty() {
            let inner = &inner[..close];
            let comma = find_top_level(inner, ',').ok_or_else(malformed)?;
            let key_type = inner[..comma].trim();
            let value_type = inner[comma + 1..].trim();
            if key_type.is_empty() || value_type.is_empty() {
                return Err(malformed());
            }
            return Ok(Shape::Record {
                key_type: key_type.to_string(),
                value_type: value_type.to_string(),
            });
        }
    }

    if let Some(elem) = expr.strip_suffix("[]") {
        return Ok(Shape::Array(strip_parens(elem.trim()).to_string()));
    }

    Ok(Shape::Named(expr.to_string()))
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn classify_branch(alt: &str) -> Branch {
    if let Some(lit) = unquote(alt) {
        return Branch::Literal(lit.trim().to_string());
    }
    match Primitive::from_name(alt) {
        Some(p) => Branch::Primitive(p),
        None => Branch::Interface(strip_parens(alt).to_string()),
    }
}

/// `"x"`, `'x'` or `` `x` `` → `x`.
fn unquote(s: &str) -> Option<String> {
    let mut chars = s.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if matches!(first, '"' | '\'' | '`') && first == last {
        Some(s[1..s.len() - 1].to_string())
    } else {
        None
    }
}

/// Split off a trailing `// comment` that sits outside quotes.
fn split_comment(line: &str) -> (&str, Option<String>) {
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q && prev != '\\' => quote = None,
            Some(_) => {}
            None if matches!(c, '"' | '\'' | '`') => quote = Some(c),
            None if c == '/' && prev == '/' => {
                let comment = line[i + 1..].trim_start_matches('/').trim();
                let code = line[..i - 1].trim_end();
                return (code, (!comment.is_empty()).then(|| comment.to_string()));
            }
            None => {}
        }
        prev = c;
    }
    (line, None)
}

/// Byte index of the first `needle` at nesting depth 0, outside quotes.
fn find_top_level(s: &str, needle: char) -> Option<usize> {
    split_positions(s, needle).into_iter().next()
}

fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for at in split_positions(s, sep) {
        parts.push(&s[start..at]);
        start = at + sep.len_utf8();
    }
    parts.push(&s[start..]);
    parts
}

fn split_positions(s: &str, sep: char) -> Vec<usize> {
    let mut out = Vec::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if c == q && prev != '\\' {
                quote = None;
            }
            prev = c;
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            _ if c == sep && depth == 0 => out.push(i),
            _ => {}
        }
        prev = c;
    }
    out
}

/// Byte index of the `>` closing an already opened `<`, outside quotes.
fn closing_angle(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q && prev != '\\' => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' | '`' => quote = Some(c),
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        prev = c;
    }
    None
}

/// `(A | B)` → `A | B`, only when the outer parens wrap the whole expression.
fn strip_parens(s: &str) -> &str {
    let mut s = s.trim();
    while s.starts_with('(') && s.ends_with(')') {
        let inner = &s[1..s.len() - 1];
        // `(a) | (b)` must stay as is
        let mut depth = 0i32;
        let balanced = inner.chars().all(|c| {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            depth >= 0
        });
        if !balanced {
            break;
        }
        s = inner.trim();
    }
    s
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
