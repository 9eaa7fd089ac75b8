//! Reader for story files written as a JavaScript assignment
//! (`var config = { ... };`) or as a bare object literal / JSON document.
//!
//! Only the literal subset authors actually use is accepted: objects, arrays,
//! strings (single, double or back-quoted without interpolation), numbers,
//! `true`, `false`, `null` and `undefined`, plus comments and trailing commas.

use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::lexer::{Spanned, Token, lex, unescape};
use crate::story_config::StoryConfig;
use crate::validation::{ConfigError, validate};

#[derive(Debug)]
pub enum ReadError {
    Io(std::io::Error),
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    Shape(serde_json::Error),
    Invalid(ConfigError),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io(err) => write!(f, "I/O error: {err}"),
            ReadError::Syntax {
                line,
                column,
                message,
            } => write!(f, "syntax error at {line}:{column}: {message}"),
            ReadError::Shape(err) => write!(f, "malformed story: {err}"),
            ReadError::Invalid(err) => write!(f, "invalid story: {err}"),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(err) => Some(err),
            ReadError::Shape(err) => Some(err),
            ReadError::Invalid(err) => Some(err),
            ReadError::Syntax { .. } => None,
        }
    }
}

/// Parsed source: the binding name (if the file is an assignment) and the
/// literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSource {
    pub binding: Option<String>,
    pub value: Value,
}

const ROOT_KEYS: &[&str] = &[
    "accessToken",
    "style",
    "theme",
    "showMarkers",
    "alignment",
    "toptitle",
    "title",
    "byline",
    "description",
    "chapters",
];

const CHAPTER_KEYS: &[&str] = &[
    "id",
    "title",
    "image",
    "imageCredit",
    "description",
    "location",
    "onChapterEnter",
    "onChapterExit",
    "chapterLegend",
];

/// Parses and checks a story. This is the path every loader should use.
pub fn read_config(src: &str) -> Result<StoryConfig, ReadError> {
    let config = parse_config(src)?;
    validate(&config).map_err(ReadError::Invalid)?;
    Ok(config)
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<StoryConfig, ReadError> {
    let src = fs::read_to_string(path).map_err(ReadError::Io)?;
    read_config(&src)
}

/// Parses a story without running [`validate`].
pub fn parse_config(src: &str) -> Result<StoryConfig, ReadError> {
    let source = parse_source(src)?;
    config_from_value(source.value)
}

pub fn config_from_value(value: Value) -> Result<StoryConfig, ReadError> {
    log_unknown_keys(&value);
    serde_json::from_value(value).map_err(ReadError::Shape)
}

pub fn parse_source(src: &str) -> Result<ConfigSource, ReadError> {
    let mut p = Parser::new(src)?;
    let binding = p.binding()?;
    let value = p.value()?.unwrap_or(Value::Null);
    p.eat(Token::Semicolon);
    if p.peek().is_some() {
        return Err(p.error("unexpected content after the story literal"));
    }
    Ok(ConfigSource { binding, value })
}

fn log_unknown_keys(value: &Value) {
    let Some(root) = value.as_object() else {
        return;
    };
    for key in root.keys().filter(|k| !ROOT_KEYS.contains(&k.as_str())) {
        debug!(key = %key, "ignoring unknown story field");
    }
    let chapters = root.get("chapters").and_then(Value::as_array);
    for (index, chapter) in chapters.into_iter().flatten().enumerate() {
        let Some(chapter) = chapter.as_object() else {
            continue;
        };
        for key in chapter.keys().filter(|k| !CHAPTER_KEYS.contains(&k.as_str())) {
            debug!(chapter = index, key = %key, "ignoring unknown chapter field");
        }
    }
}

/// Deepest nesting of objects and arrays a story may use.
pub const MAX_DEPTH: usize = 128;

/// Recursive descent over the token stream.
struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Spanned<'a>>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, ReadError> {
        // Editors on Windows like to prepend a byte order mark.
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        let tokens = lex(src).map_err(|e| {
            syntax_error(src, e.offset, &format!("unexpected input '{}'", e.slice))
        })?;
        Ok(Self {
            src,
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|t| t.token)
    }

    fn eat(&mut self, token: Token<'a>) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'a>, what: &str) -> Result<(), ReadError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    /// Error positioned at the next token, or at the end of input.
    fn error(&self, message: &str) -> ReadError {
        let offset = self
            .tokens
            .get(self.pos)
            .map_or(self.src.len(), |t| t.span.start);
        syntax_error(self.src, offset, message)
    }

    /// `var|let|const <name> =`, optional.
    fn binding(&mut self) -> Result<Option<String>, ReadError> {
        if !matches!(self.peek(), Some(Token::Ident("var" | "let" | "const"))) {
            return Ok(None);
        }
        self.pos += 1;
        let Some(Token::Ident(name)) = self.peek() else {
            return Err(self.error("expected a binding name"));
        };
        self.pos += 1;
        self.expect(Token::Equals, "'='")?;
        Ok(Some(name.to_string()))
    }

    /// `None` stands for `undefined`.
    fn value(&mut self) -> Result<Option<Value>, ReadError> {
        let Some(token) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };
        let value = match token {
            Token::BraceOpen => self.nested(Self::object)?,
            Token::BracketOpen => self.nested(Self::array)?,
            Token::Str(raw) => Value::String(self.string(raw)?),
            Token::Number(_) | Token::Minus | Token::Plus => self.number()?,
            Token::Ident("true") => Value::Bool(true),
            Token::Ident("false") => Value::Bool(false),
            Token::Ident("null") => Value::Null,
            Token::Ident("undefined") => {
                self.pos += 1;
                return Ok(None);
            }
            Token::Ident(other) => {
                return Err(self.error(&format!("unsupported expression '{other}'")));
            }
            _ => return Err(self.error("expected a value")),
        };
        if matches!(token, Token::Ident(_)) {
            self.pos += 1;
        }
        Ok(Some(value))
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, ReadError>,
    ) -> Result<Value, ReadError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn object(&mut self) -> Result<Value, ReadError> {
        self.expect(Token::BraceOpen, "'{'")?;
        let mut map = Map::new();
        while !self.eat(Token::BraceClose) {
            let key = self.key()?;
            self.expect(Token::Colon, "':'")?;
            // Later duplicates win, as in JavaScript.
            match self.value()? {
                Some(v) => {
                    map.insert(key, v);
                }
                None => {
                    map.remove(&key);
                }
            }
            if !self.eat(Token::Comma) {
                self.expect(Token::BraceClose, "',' or '}'")?;
                break;
            }
        }
        Ok(Value::Object(map))
    }

    fn key(&mut self) -> Result<String, ReadError> {
        match self.peek() {
            Some(Token::Str(raw)) => self.string(raw),
            Some(Token::Number(_)) => match self.number()? {
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(self.error("invalid numeric key")),
            },
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name.to_string())
            }
            _ => Err(self.error("expected a property name")),
        }
    }

    fn array(&mut self) -> Result<Value, ReadError> {
        self.expect(Token::BracketOpen, "'['")?;
        let mut items = Vec::new();
        while !self.eat(Token::BracketClose) {
            // `undefined` inside an array exports as null.
            items.push(self.value()?.unwrap_or(Value::Null));
            if !self.eat(Token::Comma) {
                self.expect(Token::BracketClose, "',' or ']'")?;
                break;
            }
        }
        Ok(Value::Array(items))
    }

    /// Decodes the string token at the cursor and consumes it.
    fn string(&mut self, raw: &str) -> Result<String, ReadError> {
        let quote = raw.chars().next();
        let body = &raw[1..raw.len() - 1];
        if quote == Some('`') && body.contains("${") {
            return Err(self.error("template interpolation is not supported"));
        }
        let text = unescape(body).map_err(|message| self.error(message))?;
        self.pos += 1;
        Ok(text)
    }

    /// An optionally signed number starting at the cursor.
    fn number(&mut self) -> Result<Value, ReadError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some(Token::Minus) => true,
            Some(Token::Plus) => false,
            _ => {
                return self.unsigned(false);
            }
        };
        self.pos += 1;
        match self.peek() {
            Some(Token::Number(_)) => self.unsigned(negative),
            Some(Token::Ident("Infinity" | "NaN")) => {
                self.pos = start;
                Err(self.error("non-finite numbers are not supported"))
            }
            _ => Err(self.error("expected a number")),
        }
    }

    fn unsigned(&mut self, negative: bool) -> Result<Value, ReadError> {
        let Some(Token::Number(text)) = self.peek() else {
            return Err(self.error("expected a number"));
        };
        let magnitude = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(digits) => u64::from_str_radix(digits, 16).ok().map(|v| v as f64),
            None => text.replace('_', "").parse::<f64>().ok(),
        };
        let Some(magnitude) = magnitude else {
            return Err(self.error("invalid number"));
        };
        let v = if negative { -magnitude } else { magnitude };
        let value = number_value(v).ok_or_else(|| self.error("number out of range"))?;
        self.pos += 1;
        Ok(value)
    }
}

fn syntax_error(src: &str, offset: usize, message: &str) -> ReadError {
    let consumed = &src[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map_or(0, |l| l.chars().count())
        + 1;
    ReadError::Syntax {
        line,
        column,
        message: message.to_string(),
    }
}

fn number_value(v: f64) -> Option<Value> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if v.fract() == 0.0 && v.abs() <= MAX_SAFE {
        return Some(Value::Number(Number::from(v as i64)));
    }
    Number::from_f64(v).map(Value::Number)
}
