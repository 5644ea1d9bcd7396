//! Balanced-delimiter scanning shared by the stylesheet raw parser, kept
//! separate from `cursor::SourceCursor` since it's specific to brace/paren
//! matching rather than general character-stream primitives.

use crate::cursor::SourceCursor;
use crate::error::{Error, ErrorKind};

/// Consumes up to (and including) the matching `close`, assuming `open` was
/// already consumed by the caller. Quoted strings are skipped opaquely so a
/// brace inside a string literal never affects depth.
pub fn read_balanced(cursor: &mut SourceCursor, open: char, close: char, unclosed: ErrorKind) -> Result<String, Error> {
    let start = cursor.position();
    let mut out = String::new();
    let mut depth = 1;
    loop {
        match cursor.peek() {
            None => {
                return Err(Error::new(
                    start.line.max(1) as usize,
                    start.column.max(1) as usize,
                    unclosed,
                    "reached end of input before the closing delimiter",
                ));
            }
            Some('"') | Some('\'') => {
                out.push_str(&cursor.read_string()?);
            }
            Some(c) if c == open => {
                depth += 1;
                out.push(c);
                cursor.advance();
            }
            Some(c) if c == close => {
                depth -= 1;
                cursor.advance();
                if depth == 0 {
                    return Ok(out);
                }
                out.push(c);
            }
            Some(c) => {
                out.push(c);
                cursor.advance();
            }
        }
    }
}

/// Reads up to (not including) the first unescaped, top-level occurrence of
/// any char in `terminators`, treating quoted strings opaquely and
/// paren/bracket nesting as depth so e.g. a `;` inside `url(...)` does not
/// end a declaration early. Returns the consumed text and which terminator
/// (if any) stopped it; `None` means EOF was reached first.
pub fn read_until_top_level(cursor: &mut SourceCursor, terminators: &[char]) -> (String, Option<char>) {
    let mut out = String::new();
    let mut depth = 0i32;
    loop {
        match cursor.peek() {
            None => return (out, None),
            Some('"') | Some('\'') => match cursor.read_string() {
                Ok(s) => out.push_str(&s),
                Err(_) => return (out, None),
            },
            Some(c) if depth == 0 && terminators.contains(&c) => return (out, Some(c)),
            Some(c @ ('(' | '[')) => {
                depth += 1;
                out.push(c);
                cursor.advance();
            }
            Some(c @ (')' | ']')) => {
                depth -= 1;
                out.push(c);
                cursor.advance();
            }
            Some(c) => {
                out.push(c);
                cursor.advance();
            }
        }
    }
}
