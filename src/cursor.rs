//! Source Cursor — line/column-tracking character stream.
//!
//! A `Vec<char>` input buffer with `position`/`row`/`column` fields and
//! `peek`/`advance` primitives, 1-based `(line, column)` positions, and an
//! explicit snapshot/restore pair instead of ad-hoc save/restore triples
//! scattered at call sites.

use crate::error::{Error, ErrorKind};

/// A 1-based (line, column) anchor. `(-1, -1)` marks a synthesized unit
/// that never came from source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourcePosition {
    pub line: i64,
    pub column: i64,
}

impl SourcePosition {
    pub const SYNTHESIZED: SourcePosition = SourcePosition { line: -1, column: -1 };

    pub fn new(line: i64, column: i64) -> Self {
        Self { line, column }
    }

    pub fn is_synthesized(&self) -> bool {
        self.line < 0 || self.column < 0
    }
}

/// Opaque snapshot of cursor state, restorable exactly.
#[derive(Debug, Clone, Copy)]
pub struct CursorSnapshot {
    offset: usize,
    line: i64,
    column: i64,
}

/// Line/column-tracking character stream with lookahead.
pub struct SourceCursor {
    input: Vec<char>,
    offset: usize,
    line: i64,
    column: i64,
}

impl SourceCursor {
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column)
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.offset = snapshot.offset;
        self.line = snapshot.line;
        self.column = snapshot.column;
    }

    pub fn eof(&self) -> bool {
        self.offset >= self.input.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.input.get(self.offset).copied()
    }

    pub fn peek_at(&self, lookahead: usize) -> Option<char> {
        self.input.get(self.offset + lookahead).copied()
    }

    /// Advance one code unit. Line increments on `\n`; column resets to 1 on
    /// a new line, otherwise increments by 1.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.offset).copied()?;
        self.offset += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Advance only if the next characters match `literal` exactly; on
    /// mismatch the cursor does not move.
    pub fn optionally_present(&mut self, literal: &str) -> bool {
        let snapshot = self.snapshot();
        for expected in literal.chars() {
            match self.advance() {
                Some(ch) if ch == expected => continue,
                _ => {
                    self.restore(snapshot);
                    return false;
                }
            }
        }
        true
    }

    /// Consume characters while `predicate` holds; returns the consumed slice.
    pub fn consume_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            out.push(ch);
            self.advance();
        }
        out
    }

    pub fn skip_whitespace(&mut self) -> String {
        self.consume_while(|c| c.is_whitespace())
    }

    /// CSS identifier: first char in {a-z, A-Z, `_`, `-`, `\`}; subsequent
    /// chars additionally allow digits and `-`. Returns `None` without
    /// advancing on no match.
    pub fn read_identifier(&mut self) -> Option<String> {
        let snapshot = self.snapshot();
        let first = self.peek()?;
        if !(first.is_ascii_alphabetic() || first == '_' || first == '-' || first == '\\') {
            return None;
        }
        let mut out = String::new();
        out.push(first);
        self.advance();
        loop {
            match self.peek() {
                Some(ch)
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '\\' =>
                {
                    out.push(ch);
                    self.advance();
                }
                _ => break,
            }
        }
        if out.chars().all(|c| c == '-') {
            // a lone run of dashes is not an identifier
            self.restore(snapshot);
            return None;
        }
        Some(out)
    }

    /// Reads a quoted string, honoring `"`/`'` with backslash escapes opaque
    /// to this layer (the raw layer does not interpret escape semantics, it
    /// only refuses to treat an escaped quote as a terminator).
    pub fn read_string(&mut self) -> Result<String, Error> {
        let start = self.position();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(Error::new(start.line.max(1) as usize, start.column.max(1) as usize, ErrorKind::UnclosedString, "expected string")),
        };
        self.advance();
        let mut out = String::new();
        out.push(quote);
        loop {
            match self.advance() {
                None => {
                    return Err(Error::new(
                        start.line.max(1) as usize,
                        start.column.max(1) as usize,
                        ErrorKind::UnclosedString,
                        "unterminated string literal",
                    ));
                }
                Some('\\') => {
                    out.push('\\');
                    if let Some(escaped) = self.advance() {
                        out.push(escaped);
                    }
                }
                Some(ch) if ch == quote => {
                    out.push(ch);
                    return Ok(out);
                }
                Some(ch) => out.push(ch),
            }
        }
    }

    /// Reads a CSS number: optional sign, digits, optional fractional part,
    /// optional exponent. Does not consume a trailing unit.
    pub fn read_number(&mut self) -> Option<String> {
        let snapshot = self.snapshot();
        let mut out = String::new();
        if matches!(self.peek(), Some('+' | '-')) {
            out.push(self.advance().unwrap());
        }
        let int_part = self.consume_while(|c| c.is_ascii_digit());
        out.push_str(&int_part);
        let mut has_digits = !int_part.is_empty();
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            out.push(self.advance().unwrap());
            let frac = self.consume_while(|c| c.is_ascii_digit());
            has_digits = has_digits || !frac.is_empty();
            out.push_str(&frac);
        }
        if !has_digits {
            self.restore(snapshot);
            return None;
        }
        if matches!(self.peek(), Some('e' | 'E'))
            && (self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_at(1), Some('+' | '-'))
                    && self.peek_at(2).is_some_and(|c| c.is_ascii_digit())))
        {
            out.push(self.advance().unwrap());
            if matches!(self.peek(), Some('+' | '-')) {
                out.push(self.advance().unwrap());
            }
            out.push_str(&self.consume_while(|c| c.is_ascii_digit()));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_line_and_column() {
        let mut cursor = SourceCursor::new("ab\ncd");
        assert_eq!(cursor.position(), SourcePosition::new(1, 1));
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.position(), SourcePosition::new(1, 3));
        cursor.advance(); // consumes '\n'
        assert_eq!(cursor.position(), SourcePosition::new(2, 1));
    }

    #[test]
    fn optionally_present_does_not_move_on_mismatch() {
        let mut cursor = SourceCursor::new("abc");
        assert!(!cursor.optionally_present("xyz"));
        assert_eq!(cursor.position(), SourcePosition::new(1, 1));
        assert!(cursor.optionally_present("ab"));
        assert_eq!(cursor.position(), SourcePosition::new(1, 3));
    }

    #[test]
    fn snapshot_restores_exactly() {
        let mut cursor = SourceCursor::new("abc\ndef");
        cursor.advance();
        cursor.advance();
        let snap = cursor.snapshot();
        cursor.advance();
        cursor.advance();
        cursor.advance();
        cursor.restore(snap);
        assert_eq!(cursor.position(), SourcePosition::new(1, 3));
    }

    #[test]
    fn read_identifier_stops_before_non_ident_char() {
        let mut cursor = SourceCursor::new("-moz-selection{");
        let ident = cursor.read_identifier().unwrap();
        assert_eq!(ident, "-moz-selection");
        assert_eq!(cursor.peek(), Some('{'));
    }

    #[test]
    fn read_identifier_rejects_lone_dashes() {
        let mut cursor = SourceCursor::new("--");
        assert!(cursor.read_identifier().is_none());
        assert_eq!(cursor.position(), SourcePosition::new(1, 1));
    }

    #[test]
    fn read_number_handles_decimal_and_exponent() {
        let mut cursor = SourceCursor::new("2.5e-3px");
        assert_eq!(cursor.read_number().unwrap(), "2.5e-3");
        assert_eq!(cursor.peek(), Some('p'));
    }

    #[test]
    fn read_string_is_opaque_to_escapes() {
        let mut cursor = SourceCursor::new(r#""a\"b""#);
        let s = cursor.read_string().unwrap();
        assert_eq!(s, r#""a\"b""#);
    }

    #[test]
    fn read_string_unclosed_errors() {
        let mut cursor = SourceCursor::new("\"abc");
        assert!(cursor.read_string().is_err());
    }
}
