//! Structured literal values and the single pretty-printer that lays them out
//! as JavaScript source text.
//!
//! Record builders decide *what* goes into a literal (ordered key/value pairs
//! and a [`Layout`] per container); [`render`] decides how it looks.

use std::fmt::Write as _;

use serde_json::Value;

pub const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One entry per line, indented one level deeper than the opening bracket.
    Block,
    /// `[a, b]` and `{key: value}` on a single line.
    Inline,
    /// `[a,b]`, no space after commas.
    Packed,
    /// JSON text: double-quoted keys and strings, no spaces.
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Literal>, Layout),
    Record(Vec<(String, Literal)>, Layout),
}

impl Literal {
    pub fn string(s: impl Into<String>) -> Self {
        Literal::Str(s.into())
    }

    /// Converts a JSON value, laying out containers with `layout`.
    pub fn from_json(value: &Value, layout: Layout) -> Self {
        match value {
            Value::Null => Literal::Null,
            Value::Bool(b) => Literal::Bool(*b),
            Value::Number(n) => n.as_f64().map(Literal::Number).unwrap_or(Literal::Null),
            Value::String(s) => Literal::Str(s.clone()),
            Value::Array(items) => Literal::List(
                items.iter().map(|v| Literal::from_json(v, layout)).collect(),
                layout,
            ),
            Value::Object(map) => Literal::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Literal::from_json(v, layout)))
                    .collect(),
                layout,
            ),
        }
    }
}

/// Ordered key/value pairs for one record. Absent optional values are skipped,
/// which is how `undefined` fields disappear from the output.
#[derive(Debug, Default)]
pub struct Fields {
    entries: Vec<(String, Literal)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: Literal) -> &mut Self {
        self.entries.push((key.to_string(), value));
        self
    }

    pub fn push_str(&mut self, key: &str, value: &str) -> &mut Self {
        self.push(key, Literal::string(value))
    }

    pub fn push_opt_str(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.push_str(key, v);
        }
        self
    }

    pub fn into_record(self, layout: Layout) -> Literal {
        Literal::Record(self.entries, layout)
    }
}

/// Escapes text for a single-quoted literal. Backslashes go first so the
/// escapes added afterwards are not escaped twice.
pub fn escape_single_quoted(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Number text as JavaScript's `String(n)` would print it for the values a
/// story uses: integral values carry no fractional part and `-0` prints as `0`.
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let text = if v > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Renders `lit` as if it started at nesting `level`.
pub fn render(lit: &Literal, level: usize) -> String {
    let mut out = String::new();
    write_literal(&mut out, lit, level, false);
    out
}

fn write_literal(out: &mut String, lit: &Literal, level: usize, json: bool) {
    match lit {
        Literal::Null => out.push_str("null"),
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Number(n) if json && !n.is_finite() => out.push_str("null"),
        Literal::Number(n) => out.push_str(&format_number(*n)),
        Literal::Str(s) if json => out.push_str(&json_string(s)),
        Literal::Str(s) => {
            let _ = write!(out, "'{}'", escape_single_quoted(s));
        }
        Literal::List(items, layout) => {
            let layout = effective(*layout, json);
            write_container(out, ('[', ']'), items.len(), level, layout, |out, i, lvl| {
                write_literal(out, &items[i], lvl, layout == Layout::Json);
            });
        }
        Literal::Record(entries, layout) => {
            let layout = effective(*layout, json);
            write_container(out, ('{', '}'), entries.len(), level, layout, |out, i, lvl| {
                let (key, value) = &entries[i];
                write_key(out, key, layout == Layout::Json);
                out.push_str(if layout == Layout::Json { ":" } else { ": " });
                write_literal(out, value, lvl, layout == Layout::Json);
            });
        }
    }
}

// JSON text cannot contain anything but JSON, so the mode sticks once entered.
fn effective(layout: Layout, inside_json: bool) -> Layout {
    if inside_json { Layout::Json } else { layout }
}

fn write_key(out: &mut String, key: &str, json: bool) {
    if json {
        out.push_str(&json_string(key));
    } else if is_identifier(key) {
        out.push_str(key);
    } else {
        let _ = write!(out, "'{}'", escape_single_quoted(key));
    }
}

fn write_container<F>(
    out: &mut String,
    (open, close): (char, char),
    len: usize,
    level: usize,
    layout: Layout,
    mut item: F,
) where
    F: FnMut(&mut String, usize, usize),
{
    out.push(open);
    if len == 0 {
        out.push(close);
        return;
    }
    match layout {
        Layout::Block => {
            for i in 0..len {
                if i > 0 {
                    out.push(',');
                }
                out.push('\n');
                push_indent(out, level + 1);
                item(out, i, level + 1);
            }
            out.push('\n');
            push_indent(out, level);
        }
        Layout::Inline | Layout::Packed | Layout::Json => {
            let sep = if layout == Layout::Inline { ", " } else { "," };
            for i in 0..len {
                if i > 0 {
                    out.push_str(sep);
                }
                item(out, i, level);
            }
        }
    }
    out.push(close);
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}
