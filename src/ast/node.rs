//! AST node envelope and per-kind data payloads.

use crate::ast::status::Status;
use crate::ast::term::ValueMember;
use crate::cursor::SourcePosition;
use serde::{Deserialize, Serialize};

/// A trailing or leading comment attached to a unit rather than modeled as
/// its own sibling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRuleData {
    pub name: String,
    pub prelude_raw: String,
    /// `true` once a block body `{ ... }` was present; at-rules like
    /// `@import "x";` have no block.
    pub has_block: bool,
    pub refined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorGroupData {
    pub raw: String,
    pub refined: bool,
}

/// A parsed pseudo-class or pseudo-element clause attached to a selector
/// part, e.g. `:nth-child(2n+1)` or `::before`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudoClause {
    pub name: String,
    /// Raw text between the balanced parens, if any (e.g. `"2n+1"`).
    pub args: Option<String>,
    pub is_element: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorPartData {
    pub raw: String,
    pub combinator: Option<Combinator>,
    /// Populated by selector refinement; empty until then.
    pub pseudo_clauses: Vec<PseudoClause>,
    pub refined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationData {
    pub raw: String,
    pub refined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyNameData {
    pub name: String,
    pub vendor_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValueData {
    pub members: Vec<ValueMember>,
    pub important: bool,
}

/// The data carried by a unit, keyed by its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstNodeData {
    Stylesheet,
    Rule,
    AtRule(AtRuleData),
    SelectorGroup(SelectorGroupData),
    SelectorPart(SelectorPartData),
    Declaration(DeclarationData),
    PropertyName(PropertyNameData),
    PropertyValue(PropertyValueData),
}

impl AstNodeData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AstNodeData::Stylesheet => "Stylesheet",
            AstNodeData::Rule => "Rule",
            AstNodeData::AtRule(_) => "AtRule",
            AstNodeData::SelectorGroup(_) => "SelectorGroup",
            AstNodeData::SelectorPart(_) => "SelectorPart",
            AstNodeData::Declaration(_) => "Declaration",
            AstNodeData::PropertyName(_) => "PropertyName",
            AstNodeData::PropertyValue(_) => "PropertyValue",
        }
    }

    /// Whether this kind is subject to on-demand refinement at all —
    /// Stylesheet and Rule are structural only and never themselves refined.
    pub fn is_refinable(&self) -> bool {
        matches!(
            self,
            AstNodeData::SelectorGroup(_)
                | AstNodeData::SelectorPart(_)
                | AstNodeData::Declaration(_)
                | AstNodeData::AtRule(_)
        )
    }

    /// `true` once a refiner has already claimed this unit; refinement is
    /// idempotent.
    pub fn is_refined(&self) -> bool {
        match self {
            AstNodeData::SelectorGroup(d) => d.refined,
            AstNodeData::SelectorPart(d) => d.refined,
            AstNodeData::Declaration(d) => d.refined,
            AstNodeData::AtRule(d) => d.refined,
            _ => true,
        }
    }

    pub fn mark_refined(&mut self) {
        match self {
            AstNodeData::SelectorGroup(d) => d.refined = true,
            AstNodeData::SelectorPart(d) => d.refined = true,
            AstNodeData::Declaration(d) => d.refined = true,
            AstNodeData::AtRule(d) => d.refined = true,
            _ => {}
        }
    }
}

/// A full AST unit: envelope fields common to every kind, plus kind-specific
/// data. `ego_tree::NodeId` plays the role of a weak parent reference —
/// looking a stale id up in a detached subtree's own arena still
/// resolves, but it cannot resolve back into a tree it was detached from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    pub data: AstNodeData,
    pub position: SourcePosition,
    pub comments: Vec<Comment>,
    pub status: Status,
}

impl AstNode {
    pub fn new(data: AstNodeData, position: SourcePosition) -> Self {
        Self {
            data,
            position,
            comments: Vec::new(),
            status: Status::Unbroadcasted,
        }
    }

    pub fn synthesized(data: AstNodeData) -> Self {
        Self::new(data, SourcePosition::SYNTHESIZED)
    }

    /// A unit is writable once it has entered the broadcast lifecycle and was
    /// not marked `NeverEmit`.
    pub fn is_writable(&self) -> bool {
        !matches!(self.status, Status::NeverEmit)
    }
}
