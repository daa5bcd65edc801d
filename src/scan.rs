//! Declaration scanner.
//!
//! Two passes over the raw text:
//! 1. `logical_lines` cuts the text into segments at `{`, `}`, `;` and
//!    newlines (outside quotes and open `<…>` / `(…)`), keeping `//` trailers and `/* */` doc blocks
//!    attached to the segment they describe. One-line input such as
//!    `interface A { a: string; }` therefore scans like the multi-line form.
//! 2. `scan_with` walks the segments with a tiny state machine: headers open
//!    a block or record a direct alias, member lines are collected until a
//!    lone `}` or the next header.
//!
//! Anything that is neither a header nor a member line is skipped.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::error::ParseError;
use crate::options::DuplicatePolicy;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Raw text of one declaration, before member classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclSource {
    pub name: String,
    /// 1-based line of the header.
    pub line: usize,
    /// `Some(expr)` for `type X = expr` / `interface X : expr`.
    pub alias: Option<String>,
    /// Member lines, `//` trailer included.
    pub members: Vec<String>,
    /// `/* */` blocks seen right before each member line (same indexing).
    pub docs: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    text: String,
    line: usize,
    doc: Option<String>,
}

enum Header<'a> {
    Block,
    Alias(&'a str),
}

enum State {
    Outside,
    Block { name: String, nested: usize },
    Alias { name: String },
}

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?(?:declare\s+)?(interface|type)\s+([A-Za-z_$][\w$]*)\s*(.*)$")
        .expect("header pattern")
});

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

pub fn scan(text: &str) -> Result<IndexMap<String, DeclSource>, ParseError> {
    scan_with(text, DuplicatePolicy::default())
}

pub fn scan_with(
    text: &str,
    duplicates: DuplicatePolicy,
) -> Result<IndexMap<String, DeclSource>, ParseError> {
    let mut out: IndexMap<String, DeclSource> = IndexMap::new();
    let mut state = State::Outside;

    for seg in logical_lines(text) {
        let line = seg.text.as_str();

        if let Some(caps) = HEADER.captures(line) {
            let name = caps[2].to_string();
            let rest = caps.get(3).map_or("", |m| m.as_str()).trim();
            trace!(%name, rest, line = seg.line, "header");

            if let Some(prev) = out.get(&name) {
                if duplicates == DuplicatePolicy::Reject {
                    return Err(ParseError::DuplicateDeclaration(name));
                }
                warn!(%name, first = prev.line, again = seg.line, "duplicate declaration, last one wins");
            }
            let alias = match parse_header(rest) {
                Header::Block => None,
                Header::Alias(expr) => Some(expr.to_string()),
            };
            state = match alias {
                Some(_) => State::Alias { name: name.clone() },
                None => State::Block { name: name.clone(), nested: 0 },
            };
            out.insert(name.clone(), DeclSource {
                name,
                line: seg.line,
                alias,
                members: Vec::new(),
                docs: Vec::new(),
            });
            continue;
        }

        match &mut state {
            State::Outside => {}
            State::Alias { name } => {
                let decl = &mut out[name.as_str()];
                let expr = decl.alias.get_or_insert_with(String::new);
                if line == "{" && expr.trim().is_empty() {
                    // `type T =` with the brace on the next line
                    decl.alias = None;
                    let name = std::mem::take(name);
                    state = State::Block { name, nested: 0 };
                    continue;
                }
                // `type T =` followed by `| "a"` lines
                if line.starts_with('|') || expr.trim().is_empty() || expr.trim_end().ends_with('|') {
                    if !expr.is_empty() {
                        expr.push(' ');
                    }
                    expr.push_str(line);
                } else {
                    state = State::Outside;
                }
            }
            State::Block { name, nested } => {
                if line == "}" {
                    if *nested == 0 {
                        debug!(name = %name, members = out[name.as_str()].members.len(), "declaration");
                        state = State::Outside;
                    } else {
                        *nested -= 1;
                    }
                    continue;
                }
                if *nested > 0 {
                    if line.ends_with('{') {
                        *nested += 1;
                    }
                    continue;
                }
                if line.starts_with('|') {
                    // `mode:` followed by `| "a"` lines
                    match out[name.as_str()].members.last_mut() {
                        Some(last) => continue_member(last, line),
                        None => trace!(declaration = %name, line, "stray union continuation"),
                    }
                    continue;
                }
                if !starts_member(line) {
                    continue;
                }
                let decl = &mut out[name.as_str()];
                if let Some(head) = line.strip_suffix('{') {
                    warn!(declaration = %name, member = head.trim(), "inline object types are not supported; body ignored");
                    decl.members.push(format!("{} {{}}", head.trim_end()));
                    decl.docs.push(seg.doc);
                    *nested = 1;
                    continue;
                }
                decl.members.push(line.to_string());
                decl.docs.push(seg.doc);
            }
        }
    }

    // drop aliases that never received an expression
    out.retain(|name, decl| {
        let empty = decl.alias.as_deref().is_some_and(|e| e.trim().is_empty());
        if empty {
            warn!(%name, "alias without a type expression ignored");
        }
        !empty
    });

    if out.is_empty() {
        return Err(ParseError::NoDeclarationsFound);
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_header(rest: &str) -> Header<'_> {
    if rest.is_empty() || rest.ends_with('{') {
        // `interface X {`, `interface X extends Y {`, `type X = {`, or the
        // brace on the following line
        return Header::Block;
    }
    if let Some(expr) = rest.strip_prefix('=').or_else(|| rest.strip_prefix(':')) {
        return Header::Alias(expr.trim());
    }
    // `interface X extends Y` with the brace on the next line
    Header::Block
}

fn starts_member(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$' || c == '"' || c == '\'')
}

/// Append a `| alt` line to a member, keeping its `//` trailer last.
fn continue_member(member: &mut String, line: &str) {
    let (code, comment) = match member.find(" // ") {
        Some(at) => member.split_at(at),
        None => (member.as_str(), ""),
    };
    *member = format!("{} {line}{comment}", code.trim_end());
}

fn is_member_like(seg: &Segment) -> bool {
    seg.text != "}" && !seg.text.ends_with('{')
}

/// Cut raw text into logical lines (see module docs).
fn logical_lines(text: &str) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut buf = String::new();
    let mut buf_line = 1;
    let mut line = 1;
    let mut pending_doc: Option<String> = None;
    let mut quote: Option<char> = None;
    // open `<` / `(`; `{`, `}`, `;` and newlines do not cut inside them
    let mut angle = 0usize;
    let mut paren = 0usize;
    let mut prev = '\0';
    let mut chars = text.chars().peekable();

    let flush = |buf: &mut String, buf_line: usize, out: &mut Vec<Segment>, doc: &mut Option<String>| {
        let text = buf.trim();
        if !text.is_empty() {
            out.push(Segment { text: text.to_string(), line: buf_line, doc: doc.take() });
        }
        buf.clear();
    };

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == '\n' {
                // unterminated literal: give up on it at end of line
                quote = None;
                angle = 0;
                paren = 0;
                flush(&mut buf, buf_line, &mut out, &mut pending_doc);
                line += 1;
                continue;
            }
            buf.push(c);
            if c == '\\' {
                if let Some(n) = chars.next() {
                    buf.push(n);
                }
            } else if c == q {
                quote = None;
                prev = c;
            }
            continue;
        }

        let nested = angle + paren > 0;
        match c {
            '"' | '\'' | '`' => {
                if buf.trim().is_empty() {
                    buf_line = line;
                }
                quote = Some(c);
                buf.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                let mut comment = String::new();
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    comment.push(n);
                    chars.next();
                }
                let comment = comment.trim_start_matches('/').trim();
                if comment.is_empty() || nested {
                    // dropped: inside `<…>` the logical line goes on past it
                } else if !buf.trim().is_empty() {
                    buf.push_str(" // ");
                    buf.push_str(comment);
                } else if let Some(last) = out.last_mut() {
                    if last.line == line && is_member_like(last) {
                        last.text.push_str(" // ");
                        last.text.push_str(comment);
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut body = String::new();
                let mut star = false;
                for n in chars.by_ref() {
                    if n == '\n' {
                        line += 1;
                    }
                    if star && n == '/' {
                        body.pop();
                        break;
                    }
                    body.push(n);
                    star = n == '*';
                }
                let doc = clean_block_comment(&body);
                if !doc.is_empty() {
                    pending_doc = Some(doc);
                }
            }
            '{' if !nested => {
                buf.push('{');
                flush(&mut buf, buf_line, &mut out, &mut pending_doc);
            }
            '}' if !nested => {
                flush(&mut buf, buf_line, &mut out, &mut pending_doc);
                pending_doc = None;
                out.push(Segment { text: "}".to_string(), line, doc: None });
            }
            ';' if !nested => flush(&mut buf, buf_line, &mut out, &mut pending_doc),
            '\n' if !nested => {
                flush(&mut buf, buf_line, &mut out, &mut pending_doc);
                line += 1;
            }
            '\n' => {
                buf.push(' ');
                line += 1;
            }
            _ => {
                match c {
                    // generic arguments only: `Record<`, not `a < b`; `=>` is no closer
                    '<' if prev.is_alphanumeric() || prev == '_' || prev == '$' => angle += 1,
                    '>' if prev != '=' => angle = angle.saturating_sub(1),
                    '(' => paren += 1,
                    ')' => paren = paren.saturating_sub(1),
                    _ => {}
                }
                if buf.trim().is_empty() && !c.is_whitespace() {
                    buf_line = line;
                }
                buf.push(c);
            }
        }
        prev = c;
    }
    flush(&mut buf, buf_line, &mut out, &mut pending_doc);
    out
}

fn clean_block_comment(body: &str) -> String {
    body.lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
