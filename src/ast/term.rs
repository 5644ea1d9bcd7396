//! Term and Operator — the members of a PropertyValue.

use serde::{Deserialize, Serialize};

/// How a string Term was quoted in source, so the writer can reproduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quoting {
    Double,
    Single,
}

/// A single value term. Refinement attempts these in order: numeric, hex
/// color, string, `url(...)`, function, and otherwise falls back to keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    Keyword(String),
    Numeric { value: String, unit: Option<String> },
    StringTerm { quoting: Quoting, content: String },
    HexColor(String),
    Function { name: String, raw_args: String },
    Url(String),
    /// `filter: progid:...(...)` style unquoted IE filter value — claimed
    /// whole by `IeFilterDeclarationRefiner` before the standard term
    /// parser ever sees it.
    UnquotedIeFilter(String),
}

/// Separators that may appear between Terms inside a PropertyValue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Comma,
    Slash,
    Space,
}

/// One slot in a PropertyValue's member sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueMember {
    Term(Term),
    Operator(Operator),
}
