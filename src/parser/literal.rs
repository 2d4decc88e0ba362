//! Parsing of the JS-ish object literal embedded in the schedule page.
//!
//! The source site writes the assignment with single quotes and unquoted keys,
//! so strict JSON parsing needs a normalization pass first. When that still
//! fails, a small lenient recursive-descent parser accepts the wider literal
//! grammar directly (both quote styles, bare identifiers, trailing commas).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};
use thiserror::Error;

static BARE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap());

#[derive(Debug, Error, PartialEq)]
pub enum LiteralError {
    #[error("unexpected end of literal")]
    UnexpectedEnd,
    #[error("unexpected character {ch:?} at offset {at}")]
    UnexpectedChar { ch: char, at: usize },
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

/// Parse a literal into a JSON value: strict JSON after normalization first,
/// lenient parse as the fallback.
pub fn parse_value(raw: &str) -> Result<Value, LiteralError> {
    if let Ok(value) = serde_json::from_str(&normalize_to_json(raw)) {
        return Ok(value);
    }
    parse_lenient(raw)
}

/// Best-effort rewrite into strict JSON: single quotes become double quotes
/// and bare keys get quoted. Known limitation: string values that themselves
/// contain quotes or `word:` sequences can be corrupted; the lenient parser
/// covers those.
pub fn normalize_to_json(raw: &str) -> String {
    let requoted = raw.replace('\'', "\"");
    BARE_KEY_RE.replace_all(&requoted, "$1\"$2\":").to_string()
}

/// Parse the lenient literal grammar directly.
pub fn parse_lenient(raw: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser { src: raw, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(value),
        Some(ch) => Err(LiteralError::UnexpectedChar {
            ch,
            at: parser.pos,
        }),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(LiteralError::UnexpectedChar {
                ch: c,
                at: self.pos - c.len_utf8(),
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some(q @ ('\'' | '"')) => {
                self.bump();
                Ok(Value::String(self.string(q)?))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if c == '_' || c.is_alphanumeric() => Ok(self.word()),
            Some(c) => Err(LiteralError::UnexpectedChar { ch: c, at: self.pos }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn object(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                break;
            }
            let key = self.key()?;
            self.skip_ws();
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                // Trailing comma allowed: the loop head re-checks for '}'.
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(c) => return Err(LiteralError::UnexpectedChar { ch: c, at: self.pos }),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
        Ok(Value::Object(map))
    }

    fn key(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some(q @ ('\'' | '"')) => {
                self.bump();
                self.string(q)
            }
            Some(c) if c == '_' || c.is_alphanumeric() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c == '_' || c == '.' || c.is_alphanumeric())
                {
                    self.bump();
                }
                Ok(self.src[start..self.pos].to_string())
            }
            Some(c) => Err(LiteralError::UnexpectedChar { ch: c, at: self.pos }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn array(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                break;
            }
            items.push(self.value()?);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(c) => return Err(LiteralError::UnexpectedChar { ch: c, at: self.pos }),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
        Ok(Value::Array(items))
    }

    /// Body of a string whose opening quote is already consumed.
    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(LiteralError::UnexpectedEnd),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('u') => out.push(self.unicode_escape()?),
                    Some(other) => out.push(other),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, LiteralError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let ch = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
            let digit = ch.to_digit(16).ok_or(LiteralError::UnexpectedChar {
                ch,
                at: self.pos - ch.len_utf8(),
            })?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(LiteralError::InvalidNumber(format!("\\u{code:04x}")))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Number(n.into()));
        }
        let f = text
            .parse::<f64>()
            .map_err(|_| LiteralError::InvalidNumber(text.to_string()))?;
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| LiteralError::InvalidNumber(text.to_string()))
    }

    /// Bare word: true/false/null keep their JSON meaning, anything else is a
    /// string.
    fn word(&mut self) -> Value {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c == '_' || c.is_alphanumeric()) {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" => Value::Null,
            word => Value::String(word.to_string()),
        }
    }
}

// ── Tests ──
