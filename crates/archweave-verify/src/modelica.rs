//! Declaration scanner for Modelica source.
//!
//! Only the declarative skeleton is read: class headers, `end` clauses, and
//! component declarations in declaration sections. Equation and algorithm
//! sections are skipped without being parsed.

use std::sync::LazyLock;

use archweave_core::{FieldKind, PortDirection, ScalarKind};
use regex::Regex;

static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:partial|encapsulated|final|expandable|operator|pure|impure)\s+)*(record|model|block|connector|package|class|function|type)\s+([A-Za-z_]\w*)",
    )
    .expect("class header regex")
});

static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(initial\s+)?(equation|algorithm)|(public|protected))\b")
        .expect("section regex")
});

static END_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^end\s+([A-Za-z_]\w*)\s*$").expect("end clause regex"));

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:parameter|constant|discrete|flow|stream|replaceable|inner|outer|final|redeclare)\s+)*(?:(input|output)\s+)?([A-Za-z_][\w.]*)\s*(\[[^\]]*\])?\s+([A-Za-z_]\w*)\s*(\[[^\]]*\])?",
    )
    .expect("component regex")
});

/// Words that can start a statement but never a component declaration.
const RESERVED: &[&str] = &[
    "extends", "import", "annotation", "connect", "if", "for", "when", "while", "within",
    "der", "assert", "return", "break", "end", "else", "elseif", "then",
];

/// Kind of class a definition introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    Record,
    Model,
    Block,
    Connector,
    Package,
    Other,
}

impl Restriction {
    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "record" => Self::Record,
            "model" => Self::Model,
            "block" => Self::Block,
            "connector" => Self::Connector,
            "package" => Self::Package,
            _ => Self::Other,
        }
    }
}

/// A class definition and the components declared directly in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelicaClass {
    pub name: String,
    pub restriction: Restriction,
    pub components: Vec<ModelicaComponent>,
    /// 1-based line of the class header.
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelicaComponent {
    pub name: String,
    /// Type name as written, possibly dotted (`Modelica.Blocks.Interfaces.RealInput`).
    pub type_name: String,
    /// Explicit `input`/`output` prefix, or the causality implied by a
    /// `RealInput`-style connector type.
    pub causality: Option<PortDirection>,
    /// Array dimensions as written, without brackets.
    pub dims: Option<String>,
    pub line: u32,
}

impl ModelicaComponent {
    /// Last segment of the dotted type name.
    pub fn simple_type(&self) -> &str {
        self.type_name.rsplit('.').next().unwrap_or(&self.type_name)
    }

    /// The field kind this declaration denotes, when its type is a builtin
    /// scalar and its dimensions are a single literal length.
    pub fn field_kind(&self) -> Option<FieldKind> {
        let scalar = builtin_scalar(&self.type_name)?;
        match &self.dims {
            None => Some(FieldKind::Scalar(scalar)),
            Some(dims) => dims
                .trim()
                .parse()
                .ok()
                .map(|len| FieldKind::ArrayOf(scalar, len)),
        }
    }
}

fn builtin_scalar(type_name: &str) -> Option<ScalarKind> {
    match type_name {
        "Real" => Some(ScalarKind::Real),
        "Integer" => Some(ScalarKind::Integer),
        "Boolean" => Some(ScalarKind::Boolean),
        "String" => Some(ScalarKind::String),
        _ => None,
    }
}

fn connector_causality(type_name: &str) -> Option<PortDirection> {
    let simple = type_name.rsplit('.').next().unwrap_or(type_name);
    ["Real", "Integer", "Boolean"]
        .iter()
        .find_map(|kind| match simple.strip_prefix(kind) {
            Some("Input") => Some(PortDirection::In),
            Some("Output") => Some(PortDirection::Out),
            _ => None,
        })
}

/// Scan Modelica source text for class definitions.
///
/// Classes are returned in the order their headers appear; nested classes
/// are listed individually under their simple names.
pub fn scan(source: &str) -> Vec<ModelicaClass> {
    let text = blank_comments_and_strings(source);
    let mut classes: Vec<ModelicaClass> = Vec::new();
    // Open classes as (index into `classes`, in declaration section)
    let mut open: Vec<(usize, bool)> = Vec::new();

    let mut offset = 0;
    for statement in text.split(';') {
        let start = offset;
        offset += statement.len() + 1;

        let mut rest = statement;
        loop {
            let trimmed = rest.trim_start();
            let at = start + (statement.len() - trimmed.len());
            if let Some(caps) = CLASS_HEADER.captures(trimmed) {
                let end = caps.get(0).map_or(0, |m| m.end());
                // Short class definitions (`connector RealInput = input Real`)
                if trimmed[end..].trim_start().starts_with('=') {
                    rest = "";
                    break;
                }
                classes.push(ModelicaClass {
                    name: caps[2].to_string(),
                    restriction: Restriction::from_keyword(&caps[1]),
                    components: Vec::new(),
                    line: line_of(&text, at),
                });
                open.push((classes.len() - 1, true));
                rest = &trimmed[end..];
                continue;
            }
            if let Some(caps) = SECTION.captures(trimmed) {
                let declarations = caps.get(3).is_some();
                if let Some(top) = open.last_mut() {
                    top.1 = declarations;
                }
                rest = &trimmed[caps.get(0).map_or(0, |m| m.end())..];
                continue;
            }
            // Class description string; its contents are already blanked
            if let Some(after) = trimmed.strip_prefix('"') {
                rest = after.find('"').map_or("", |close| &after[close + 1..]);
                continue;
            }
            rest = trimmed;
            break;
        }

        let statement_at = start + (statement.len() - rest.len());
        let rest = rest.trim();
        if rest.is_empty() {
            continue;
        }
        if END_CLAUSE.is_match(rest) {
            open.pop();
            continue;
        }
        let Some(&(class, true)) = open.last() else {
            continue;
        };
        if let Some(component) = component(rest, line_of(&text, statement_at)) {
            classes[class].components.push(component);
        }
    }
    classes
}

fn component(statement: &str, line: u32) -> Option<ModelicaComponent> {
    let caps = COMPONENT.captures(statement)?;
    let type_name = caps[2].to_string();
    if RESERVED.contains(&type_name.as_str()) {
        return None;
    }
    let causality = match caps.get(1).map(|m| m.as_str()) {
        Some("input") => Some(PortDirection::In),
        Some("output") => Some(PortDirection::Out),
        _ => connector_causality(&type_name),
    };
    let dims = caps
        .get(5)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim_matches(|c| c == '[' || c == ']').to_string());
    Some(ModelicaComponent {
        name: caps[4].to_string(),
        type_name,
        causality,
        dims,
        line,
    })
}

fn line_of(text: &str, offset: usize) -> u32 {
    let offset = offset.min(text.len());
    text.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() as u32 + 1
}

/// Replace comments and the contents of string literals with spaces.
///
/// Newlines are kept so offsets and line numbers stay valid.
fn blank_comments_and_strings(source: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        Line,
        Block,
        Str,
    }
    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        let blank = |out: &mut String, c: char| {
            if c == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat(' ').take(c.len_utf8()));
            }
        };
        match state {
            State::Code => match (c, chars.peek()) {
                ('/', Some('/')) => {
                    chars.next();
                    out.push_str("  ");
                    state = State::Line;
                }
                ('/', Some('*')) => {
                    chars.next();
                    out.push_str("  ");
                    state = State::Block;
                }
                ('"', _) => {
                    out.push('"');
                    state = State::Str;
                }
                _ => out.push(c),
            },
            State::Line => {
                if c == '\n' {
                    state = State::Code;
                }
                blank(&mut out, c);
            }
            State::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::Str => match c {
                '\\' => {
                    out.push(' ');
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                }
                '"' => {
                    out.push('"');
                    state = State::Code;
                }
                _ => blank(&mut out, c),
            },
        }
    }
    out
}
