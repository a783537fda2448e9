//! YAIL source text reader.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::SExpr;

/// Errors that can occur while reading source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("unexpected end of input (form opened at line {line}, column {column})")]
    UnexpectedEof { line: usize, column: usize },

    #[error("unexpected ')' at line {line}, column {column}")]
    UnexpectedClose { line: usize, column: usize },

    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("invalid token '{token}' at line {line}, column {column}")]
    InvalidToken {
        token: String,
        line: usize,
        column: usize,
    },

    #[error("forms nested deeper than {} levels at line {line}, column {column}", MAX_NESTING)]
    TooDeep { line: usize, column: usize },

    #[error("expected exactly one form, found {0}")]
    FormCount(usize),
}

/// Deepest list or quote nesting the reader and validator accept.
pub const MAX_NESTING: usize = 1000;

/// Read every top-level form in `source`.
pub fn read(source: &str) -> Result<Vec<SExpr>, ReadError> {
    let mut reader = Reader::new(source);
    let mut forms = Vec::new();
    while let Some(form) = reader.read_form()? {
        forms.push(form);
    }
    Ok(forms)
}

/// Read a source text that must contain exactly one form.
pub fn read_one(source: &str) -> Result<SExpr, ReadError> {
    let mut forms = read(source)?;
    if forms.len() != 1 {
        return Err(ReadError::FormCount(forms.len()));
    }
    Ok(forms.remove(0))
}

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    /// Run `read` one nesting level deeper.
    fn nested<T>(
        &mut self,
        line: usize,
        column: usize,
        read: impl FnOnce(&mut Self) -> Result<T, ReadError>,
    ) -> Result<T, ReadError> {
        if self.depth >= MAX_NESTING {
            return Err(ReadError::TooDeep { line, column });
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace and `;` line comments.
    fn skip_atmosphere(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Read the next form, or `None` at end of input.
    fn read_form(&mut self) -> Result<Option<SExpr>, ReadError> {
        self.skip_atmosphere();
        let (line, column) = (self.line, self.column);
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        match c {
            '(' => {
                self.bump();
                self.nested(line, column, |r| r.read_list(line, column)).map(Some)
            }
            ')' => Err(ReadError::UnexpectedClose { line, column }),
            '\'' => {
                self.bump();
                let datum = self.nested(line, column, |r| r.read_required(line, column))?;
                Ok(Some(SExpr::quote(datum)))
            }
            '"' => {
                self.bump();
                self.read_string(line, column).map(Some)
            }
            _ => self.read_atom(line, column).map(Some),
        }
    }

    fn read_required(&mut self, line: usize, column: usize) -> Result<SExpr, ReadError> {
        self.read_form()?
            .ok_or(ReadError::UnexpectedEof { line, column })
    }

    fn read_list(&mut self, line: usize, column: usize) -> Result<SExpr, ReadError> {
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere();
            match self.peek() {
                None => return Err(ReadError::UnexpectedEof { line, column }),
                Some(')') => {
                    self.bump();
                    return Ok(SExpr::List(items));
                }
                Some(_) => items.push(self.read_required(line, column)?),
            }
        }
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<SExpr, ReadError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(ReadError::UnterminatedString { line, column }),
                Some('"') => return Ok(SExpr::String(text)),
                Some('\\') => match self.bump() {
                    None => return Err(ReadError::UnterminatedString { line, column }),
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(other) => text.push(other),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn read_atom(&mut self, line: usize, column: usize) -> Result<SExpr, ReadError> {
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '\'') {
                break;
            }
            token.push(c);
            self.bump();
        }

        if let Some(rest) = token.strip_prefix('#') {
            return match rest {
                "t" | "true" => Ok(SExpr::Bool(true)),
                "f" | "false" => Ok(SExpr::Bool(false)),
                _ => Err(ReadError::InvalidToken {
                    token,
                    line,
                    column,
                }),
            };
        }

        if let Some(n) = parse_number(&token) {
            return Ok(SExpr::Number(n));
        }

        Ok(SExpr::Symbol(token))
    }
}

/// Parse a decimal numeric literal: `[+-]digits[.digits][e[+-]digits]` or
/// `[+-].digits[...]`. Anything else (including a bare `+` or `-`) is a symbol.
pub fn parse_number(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return None;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
    }

    if i != bytes.len() {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_tokens() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-1.5"), Some(-1.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("+"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1+"), None);
        assert_eq!(parse_number("1e"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_positions_in_errors() {
        let err = read("(a\n  (b c)").unwrap_err();
        assert_eq!(err, ReadError::UnexpectedEof { line: 1, column: 1 });

        let err = read("(a)\n  )").unwrap_err();
        assert_eq!(err, ReadError::UnexpectedClose { line: 2, column: 3 });
    }
}
