//! AST model: arena, node envelope/data, lifecycle status, value terms.

pub mod json;
pub mod node;
pub mod status;
pub mod term;
pub mod tree;

pub use node::{
    AstNode, AstNodeData, AtRuleData, Combinator, Comment, DeclarationData, PropertyNameData,
    PropertyValueData, PseudoClause, SelectorGroupData, SelectorPartData,
};
pub use status::Status;
pub use term::{Operator, Quoting, Term, ValueMember};
pub use tree::AstArena;

use ego_tree::NodeId;

/// A parsed stylesheet: the arena plus its root id, a small convenience
/// wrapper so callers don't juggle the two separately.
pub struct Stylesheet {
    pub arena: AstArena,
    root: NodeId,
    /// Comments that trail the last rule/at-rule with nothing left to
    /// attach to — trailing comments with no following unit are kept here
    /// rather than dropped.
    pub orphaned_comments: Vec<Comment>,
}

impl Stylesheet {
    pub fn new() -> Self {
        let arena = AstArena::new();
        let root = arena.root_id();
        Self {
            arena,
            root,
            orphaned_comments: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::new()
    }
}
