//! # Relaxed Literal Parser
//!
//! Parses the object literal captured from a loader config call into a
//! `serde_json::Value`.
//!
//! ## Grammar
//!
//! A superset of JSON and a subset of JS literal syntax:
//!
//! | Construct | Accepted forms |
//! |-----------|----------------|
//! | Strings | `"..."`, `'...'`, JSON escapes plus `\'`, `\v`, `\0`, `\xHH`, line continuations |
//! | Numbers | decimal with optional `+`/`-`, leading or trailing `.`, exponent, `0x` hex |
//! | Keywords | `true`, `false`, `null`, `undefined` (read as `null`) |
//! | Object keys | identifiers, strings, numbers |
//! | Separators | trailing commas in objects and arrays |
//! | Comments | `// line` and `/* block */` |
//!
//! Functions, regular expressions, template strings and any other expression
//! are rejected with a positioned syntax error.

use crate::domain::errors::ConfigFormatError;
use serde_json::{Map, Number, Value};

/// Maximum nesting of objects and arrays.
pub const MAX_DEPTH: usize = 128;

/// Parse a complete literal. Trailing non-trivia content is an error.
pub fn parse_literal(text: &str) -> Result<Value, ConfigFormatError> {
    let mut parser = Parser::new(text);
    parser.skip_trivia()?;
    let value = parser.parse_value(0)?;
    parser.skip_trivia()?;

    if parser.peek().is_some() {
        return Err(parser.error("unexpected content after literal"));
    }

    Ok(value)
}

/// JSON type name of a value, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ConfigFormatError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn error(&self, message: &str) -> ConfigFormatError {
        let consumed = &self.src[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;

        ConfigFormatError::Syntax {
            line,
            column,
            message: message.to_string(),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ConfigFormatError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    match self.rest().find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => {
                            self.pos = start;
                            return Err(self.error("unterminated block comment"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ConfigFormatError> {
        if depth > MAX_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }

        match self.peek() {
            Some('{') => self.parse_object(depth),
            Some('[') => self.parse_array(depth),
            Some(quote @ ('"' | '\'')) => self.parse_string(quote).map(Value::String),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            Some(c) if is_ident_start(c) => self.parse_keyword(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of literal")),
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, ConfigFormatError> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                return Ok(Value::Object(map));
            }

            let key = self.parse_key()?;
            self.skip_trivia()?;
            self.expect(':')?;
            self.skip_trivia()?;
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);

            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            return Ok(Value::Object(map));
        }
    }

    fn parse_key(&mut self) -> Result<String, ConfigFormatError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(c) if is_ident_start(c) => Ok(self.parse_identifier().to_string()),
            Some(c) if c.is_ascii_digit() => match self.parse_number()? {
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(self.error("invalid numeric key")),
            },
            _ => Err(self.error("expected object key")),
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, ConfigFormatError> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.eat(']') {
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value(depth + 1)?);

            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            return Ok(Value::Array(items));
        }
    }

    fn parse_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn parse_keyword(&mut self) -> Result<Value, ConfigFormatError> {
        let start = self.pos;
        match self.parse_identifier() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" | "undefined" => Ok(Value::Null),
            other => {
                let message = format!("unsupported expression '{other}'");
                self.pos = start;
                Err(self.error(&message))
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, ConfigFormatError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            let Some(c) = self.bump() else {
                self.pos = start;
                return Err(self.error("unterminated string"));
            };

            match c {
                c if c == quote => return Ok(out),
                '\n' | '\r' => {
                    self.pos = start;
                    return Err(self.error("unterminated string"));
                }
                '\\' => self.parse_escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), ConfigFormatError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape"));
        };

        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            '\r' => {
                self.eat('\n');
            }
            'x' => {
                let code = self.parse_hex_digits(2)?;
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            'u' => {
                let high = self.parse_hex_digits(4)?;
                if (0xd800..0xdc00).contains(&high) && self.rest().starts_with("\\u") {
                    self.pos += 2;
                    let low = self.parse_hex_digits(4)?;
                    if (0xdc00..0xe000).contains(&low) {
                        let combined = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
                        out.push(char::from_u32(combined).unwrap_or('\u{fffd}'));
                    } else {
                        out.push('\u{fffd}');
                        out.push(char::from_u32(low).unwrap_or('\u{fffd}'));
                    }
                } else {
                    out.push(char::from_u32(high).unwrap_or('\u{fffd}'));
                }
            }
            other => out.push(other),
        }

        Ok(())
    }

    fn parse_hex_digits(&mut self, count: usize) -> Result<u32, ConfigFormatError> {
        let digits = self.rest().get(..count).unwrap_or("");
        if digits.len() != count || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("invalid hex escape"));
        }
        self.pos += count;
        u32::from_str_radix(digits, 16).map_err(|_| self.error("invalid hex escape"))
    }

    fn parse_number(&mut self) -> Result<Value, ConfigFormatError> {
        let start = self.pos;
        let negative = if self.eat('-') {
            true
        } else {
            self.eat('+');
            false
        };

        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[digits_start..self.pos];
            return match i64::from_str_radix(digits, 16) {
                Ok(magnitude) => Ok(Value::Number(Number::from(if negative {
                    -magnitude
                } else {
                    magnitude
                }))),
                Err(_) => {
                    self.pos = start;
                    Err(self.error("invalid hex number"))
                }
            };
        }

        let body_start = self.pos;
        let mut integral = true;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.eat('.') {
            integral = false;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            integral = false;
            self.bump();
            if !self.eat('-') {
                self.eat('+');
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }

        let body = &self.src[body_start..self.pos];
        if !body.chars().any(|c| c.is_ascii_digit()) {
            self.pos = start;
            return Err(self.error("invalid number"));
        }

        if integral {
            if let Ok(n) = body.parse::<i64>() {
                return Ok(Value::Number(Number::from(if negative { -n } else { n })));
            }
        }

        let parsed = body
            .trim_end_matches('.')
            .parse::<f64>()
            .ok()
            .map(|n| if negative { -n } else { n })
            .and_then(Number::from_f64);

        match parsed {
            Some(n) => Ok(Value::Number(n)),
            None => {
                self.pos = start;
                Err(self.error("invalid number"))
            }
        }
    }
}
