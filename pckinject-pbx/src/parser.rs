//! OpenStep plist parser.
//!
//! Grammar accepted:
//!
//! ```text
//! value  := dict | array | string
//! dict   := '{' ( string '=' value ';' )* '}'
//! array  := '(' ( value ( ',' value )* ','? )? ')'
//! string := bare | '"' escaped* '"'
//! ```
//!
//! `//` line comments and `/* */` block comments are trivia anywhere between
//! tokens, which covers both the `// !$*UTF8*$!` header and the id
//! annotations Xcode writes.

use crate::error::PbxError;
use crate::value::{is_bare_char, Dict, Value};

/// Parse a complete plist document.
pub fn parse(text: &str) -> Result<Value, PbxError> {
    let mut parser = Parser::new(text);
    let value = parser.value()?;
    parser.skip_trivia()?;
    match parser.peek() {
        None => Ok(value),
        Some(c) => Err(parser.error(format!("unexpected '{c}' after end of document"))),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            // A leading BOM is not trivia in the grammar but editors add it.
            chars: text.trim_start_matches('\u{feff}').chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> PbxError {
        self.error_at(self.line, self.column, message)
    }

    fn error_at(&self, line: usize, column: usize, message: impl Into<String>) -> PbxError {
        PbxError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), PbxError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
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
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            None => return Err(self.error_at(line, column, "unterminated comment")),
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PbxError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn value(&mut self) -> Result<Value, PbxError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.dict(),
            Some('(') => self.array(),
            Some('"') | Some('\'') => self.quoted().map(Value::String),
            Some(c) if is_bare_char(c) => Ok(Value::String(self.bare())),
            Some(c) => Err(self.error(format!("unexpected '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn dict(&mut self) -> Result<Value, PbxError> {
        self.bump();
        let mut dict = Dict::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Dict(dict));
            }
            let (line, column) = (self.line, self.column);
            let key = self.key()?;
            self.expect('=')?;
            let value = self.value()?;
            self.expect(';')?;
            if dict.contains_key(&key) {
                return Err(self.error_at(line, column, format!("duplicate key '{key}'")));
            }
            dict.insert(key, value);
        }
    }

    fn array(&mut self) -> Result<Value, PbxError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(')') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                Some(c) => return Err(self.error(format!("expected ',' or ')', found '{c}'"))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn key(&mut self) -> Result<String, PbxError> {
        match self.peek() {
            Some('"') | Some('\'') => self.quoted(),
            Some(c) if is_bare_char(c) => Ok(self.bare()),
            Some(c) => Err(self.error(format!("expected key, found '{c}'"))),
            None => Err(self.error("unterminated dictionary")),
        }
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !is_bare_char(c) {
                break;
            }
            if c == '/' && matches!(self.peek_at(1), Some('/') | Some('*')) {
                break;
            }
            self.bump();
            out.push(c);
        }
        out
    }

    fn quoted(&mut self) -> Result<String, PbxError> {
        let (line, column) = (self.line, self.column);
        let Some(delim) = self.bump() else {
            return Err(self.error("expected string"));
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(line, column, "unterminated string")),
                Some(c) if c == delim => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('U') => out.push(self.unicode_escape()?),
                    Some(other) => out.push(other),
                    None => return Err(self.error_at(line, column, "unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, PbxError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid \\U escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid \\U escape"))
    }
}
