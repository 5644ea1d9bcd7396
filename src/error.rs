//! Positional error types for parsing and refinement.
//!
//! A plain enum, manual `Display`, manual `std::error::Error` impl — no
//! derive-macro error crate. Every error here carries a source position,
//! since every parse or refinement failure is positional.

use std::fmt;

/// Categorizes why a raw or refinement parser failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    MissingPseudoName,
    UnparsableSelector,
    MissingColon,
    MissingValue,
    UnclosedBlock,
    UnclosedString,
    UnclosedParen,
    InvalidHexColor,
    InvalidNumber,
    /// Advisory only — never aborts processing, see `ErrorManager`.
    UnknownAtRule,
    MalformedDeclaration,
}

impl ErrorKind {
    /// Advisory errors are recorded but never abort `process()`, even under `FailFast`.
    pub fn is_advisory(&self) -> bool {
        matches!(self, ErrorKind::UnknownAtRule)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::MissingPseudoName => "missing pseudo name",
            ErrorKind::UnparsableSelector => "unparsable selector",
            ErrorKind::MissingColon => "missing colon",
            ErrorKind::MissingValue => "missing value",
            ErrorKind::UnclosedBlock => "unclosed block",
            ErrorKind::UnclosedString => "unclosed string",
            ErrorKind::UnclosedParen => "unclosed paren",
            ErrorKind::InvalidHexColor => "invalid hex color",
            ErrorKind::InvalidNumber => "invalid number",
            ErrorKind::UnknownAtRule => "unknown at-rule",
            ErrorKind::MalformedDeclaration => "malformed declaration",
        };
        write!(f, "{s}")
    }
}

/// A positional error: (line, column, kind, message).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Error {
    pub line: usize,
    pub column: usize,
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(line: usize, column: usize, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line, self.column, self.kind, self.message
        )
    }
}

impl std::error::Error for Error {}

/// Controls whether `process()` aborts on the first non-advisory error or
/// collects every error and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorManager {
    #[default]
    FailFast,
    Collect,
}

impl ErrorManager {
    /// Record `err`, returning `Err` immediately under `FailFast` (unless advisory),
    /// or pushing to `collected` and returning `Ok(())` under `Collect`.
    pub fn report(&self, err: Error, collected: &mut Vec<Error>) -> Result<(), Error> {
        if err.kind.is_advisory() {
            collected.push(err);
            return Ok(());
        }
        match self {
            ErrorManager::FailFast => Err(err),
            ErrorManager::Collect => {
                collected.push(err);
                Ok(())
            }
        }
    }
}
