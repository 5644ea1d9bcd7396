//! `AstArena` — the mutable object tree backing a Stylesheet.
//!
//! Built on `ego_tree::Tree` for O(1) parent/child/sibling access. Unlike a
//! read-mostly document tree, this arena is mutated throughout parsing,
//! refinement, and plugin rework, so it exposes `append_child`/`detach`/
//! `deep_copy` directly instead of building a query layer over an
//! already-final tree.

use ego_tree::{NodeId, NodeMut, NodeRef, Tree};

use crate::ast::node::{AstNode, AstNodeData};
use crate::ast::status::Status;
use crate::cursor::SourcePosition;

/// Owns every unit of a single stylesheet. `NodeId` doubles as a weak
/// parent reference: a detached subtree keeps its ids valid within its own
/// arena, but those ids cannot resolve back into the arena it was cut
/// from, so there is no way to dereference a parent that no longer wants
/// you.
pub struct AstArena {
    tree: Tree<AstNode>,
}

impl AstArena {
    /// Starts a fresh arena rooted at a Stylesheet unit.
    pub fn new() -> Self {
        let root = AstNode::new(AstNodeData::Stylesheet, SourcePosition::new(1, 1));
        Self { tree: Tree::new(root) }
    }

    pub fn root_id(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, AstNode>> {
        self.tree.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<NodeMut<'_, AstNode>> {
        self.tree.get_mut(id)
    }

    /// Appends `data` as the last child of `parent`, returning the new id.
    /// Ordering of prior siblings is preserved — ego-tree's append always
    /// lands after the last existing child.
    pub fn append_child(&mut self, parent: NodeId, node: AstNode) -> Option<NodeId> {
        let mut parent_mut = self.tree.get_mut(parent)?;
        Some(parent_mut.append(node).id())
    }

    /// Detaches `id` and its subtree from the arena. The unit keeps its data
    /// and children; only its place among its former parent's children is
    /// cut — the node and its children survive, just orphaned.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Inserts `node` as the previous sibling of `sibling`, returning its
    /// id. Used by rework plugins that must land generated content before
    /// an existing unit rather than after it (e.g. a mirrored rule that has
    /// to render ahead of the original it was derived from).
    pub fn insert_before(&mut self, sibling: NodeId, node: AstNode) -> Option<NodeId> {
        let mut sibling_mut = self.tree.get_mut(sibling)?;
        Some(sibling_mut.insert_before(node).id())
    }

    /// Inserts `node` as the next sibling of `sibling`, returning its id.
    pub fn insert_after(&mut self, sibling: NodeId, node: AstNode) -> Option<NodeId> {
        let mut sibling_mut = self.tree.get_mut(sibling)?;
        Some(sibling_mut.insert_after(node).id())
    }

    /// `true` when the unit at `id` should appear in writer output: it
    /// exists, its own status is not `NeverEmit`, and — for a refined
    /// composite whose rendering is assembled from its children (a
    /// Declaration rendering from its PropertyName/PropertyValue) — every
    /// child is writable too. A composite with one child pruned to
    /// `NeverEmit` is suppressed whole rather than rendered malformed.
    pub fn is_writable(&self, id: NodeId) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        if !node.value().is_writable() {
            return false;
        }
        if !Self::is_composite(&node.value().data) {
            return true;
        }
        node.children().all(|child| self.is_writable(child.id()))
    }

    /// Unit kinds whose own writability depends on all of their children
    /// also being writable.
    fn is_composite(data: &AstNodeData) -> bool {
        matches!(data, AstNodeData::Declaration(d) if d.refined)
    }

    pub fn set_status(&mut self, id: NodeId, status: Status) -> bool {
        match self.tree.get_mut(id) {
            Some(mut node) => {
                let cur = node.value().status;
                if !cur.can_transition_to(status) {
                    return false;
                }
                node.value().status = status;
                true
            }
            None => false,
        }
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.tree.get(id) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => Vec::new(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id).and_then(|n| n.parent()).map(|p| p.id())
    }

    /// Deep-copies the subtree rooted at `id` into a brand new, disconnected
    /// arena with fresh identity throughout, with no residual link to the
    /// source tree.
    pub fn deep_copy(&self, id: NodeId) -> Option<AstArena> {
        let source = self.tree.get(id)?;
        let mut copy = Tree::new(source.value().clone());
        Self::copy_children(source, copy.root_mut());
        Some(AstArena { tree: copy })
    }

    fn copy_children(source: NodeRef<'_, AstNode>, mut dest: NodeMut<'_, AstNode>) {
        for child in source.children() {
            let dest_child = dest.append(child.value().clone());
            Self::copy_children(child, dest_child);
        }
    }
}

impl Default for AstArena {
    fn default() -> Self {
        Self::new()
    }
}
