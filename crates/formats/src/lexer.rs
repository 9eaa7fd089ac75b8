//! Tokens of the JavaScript literal subset story files are written in.

use std::ops::Range;
use std::str::Chars;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token<'src> {
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Equals,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,

    /// Quoted string, quotes included. Escapes are decoded by [`unescape`].
    #[regex(r"'([^'\\\r\n]|\\(\r\n|.|\n))*'", |lex| lex.slice())]
    #[regex(r#""([^"\\\r\n]|\\(\r\n|.|\n))*""#, |lex| lex.slice())]
    #[regex(r"`([^`\\]|\\(\r\n|.|\n))*`", |lex| lex.slice())]
    Str(&'src str),

    /// Unsigned number; a leading sign is a separate token.
    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| lex.slice())]
    Number(&'src str),

    /// Identifiers and keywords alike (`var`, `true`, `undefined`, ...).
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'src> {
    pub token: Token<'src>,
    pub span: Range<usize>,
}

/// Input the lexer could not match, by byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub offset: usize,
    pub slice: String,
}

pub fn lex(src: &str) -> Result<Vec<Spanned<'_>>, LexError> {
    Token::lexer(src)
        .spanned()
        .map(|(token, span)| match token {
            Ok(token) => Ok(Spanned { token, span }),
            Err(()) => Err(LexError {
                offset: span.start,
                slice: src[span].to_string(),
            }),
        })
        .collect()
}

/// Decodes the body of a quoted string token (quotes already stripped).
pub fn unescape(body: &str) -> Result<String, &'static str> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') if !chars.clone().next().is_some_and(|c| c.is_ascii_digit()) => {
                out.push('\0')
            }
            Some('x') => out.push(code_point(hex(&mut chars, 2)?)),
            Some('u') => out.push(unicode_escape(&mut chars)?),
            // Line continuation.
            Some('\n') => {}
            Some('\r') => {
                if chars.clone().next() == Some('\n') {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => return Err("unterminated escape sequence"),
        }
    }
    Ok(out)
}

fn code_point(code: u32) -> char {
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn hex(chars: &mut Chars<'_>, n: usize) -> Result<u32, &'static str> {
    (0..n).try_fold(0, |acc, _| {
        chars
            .next()
            .and_then(|c| c.to_digit(16))
            .map(|d| acc * 16 + d)
            .ok_or("invalid hexadecimal escape")
    })
}

fn unicode_escape(chars: &mut Chars<'_>) -> Result<char, &'static str> {
    if chars.clone().next() == Some('{') {
        chars.next();
        let mut code: u32 = 0;
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => {
                    let digit = c.to_digit(16).ok_or("invalid unicode escape")?;
                    code = code
                        .checked_mul(16)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or("invalid code point")?;
                }
                None => return Err("invalid unicode escape"),
            }
        }
        return char::from_u32(code).ok_or("invalid code point");
    }

    let high = hex(chars, 4)?;
    if (0xD800..0xDC00).contains(&high) {
        // A surrogate pair spells one astral character.
        let mut ahead = chars.clone();
        if ahead.next() == Some('\\') && ahead.next() == Some('u') {
            if let Ok(low) = hex(&mut ahead, 4) {
                if (0xDC00..0xE000).contains(&low) {
                    *chars = ahead;
                    return Ok(code_point(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)));
                }
            }
        }
    }
    Ok(code_point(high))
}
