//! Broadcast bus — couples parsing, plugin notification, and AST assembly.
//!
//! Plain synchronous phases, no channel/async runtime — every broadcast
//! here happens in-process during a single `parse`/`process` call with no
//! concurrent producers, so an mpsc/tokio design would add machinery this
//! pipeline never needs.

use std::collections::{HashMap, VecDeque};

use ego_tree::NodeId;

use crate::ast::{AstArena, AstNodeData, Status};
use crate::error::Error;
use crate::refine::RefinementRegistry;

/// The unit kinds a subscriber can register interest in. Mirrors
/// `AstNodeData`'s variants one-to-one; kept as a separate enum so
/// subscription tables don't need to hold a full (possibly refined) payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastKind {
    Stylesheet,
    Rule,
    AtRule,
    SelectorGroup,
    SelectorPart,
    Declaration,
    PropertyName,
    PropertyValue,
}

impl BroadcastKind {
    pub fn of(data: &AstNodeData) -> Self {
        match data {
            AstNodeData::Stylesheet => BroadcastKind::Stylesheet,
            AstNodeData::Rule => BroadcastKind::Rule,
            AstNodeData::AtRule(_) => BroadcastKind::AtRule,
            AstNodeData::SelectorGroup(_) => BroadcastKind::SelectorGroup,
            AstNodeData::SelectorPart(_) => BroadcastKind::SelectorPart,
            AstNodeData::Declaration(_) => BroadcastKind::Declaration,
            AstNodeData::PropertyName(_) => BroadcastKind::PropertyName,
            AstNodeData::PropertyValue(_) => BroadcastKind::PropertyValue,
        }
    }
}

/// Bundles everything a subscriber needs to react to one broadcast:
/// mutable arena access, the refinement registry (so a subscriber can force
/// refinement before inspecting a unit), and a queue it may push follow-up
/// units onto instead of recursing directly — a reworked unit gets
/// re-broadcast through the queue rather than having its subscribers
/// called again in place.
pub struct BroadcastContext<'a> {
    pub arena: &'a mut AstArena,
    pub refinement: &'a RefinementRegistry,
    pub unit: NodeId,
    pending: &'a mut VecDeque<NodeId>,
}

impl<'a> BroadcastContext<'a> {
    /// Enqueues `unit` for a follow-up broadcast once the current drain
    /// cycle reaches it, rather than broadcasting inline (which would
    /// reenter the bus while a subscriber is already running).
    pub fn requeue(&mut self, unit: NodeId) {
        self.pending.push_back(unit);
    }
}

pub trait Subscriber {
    fn kind(&self) -> BroadcastKind;
    fn on_broadcast(&mut self, ctx: &mut BroadcastContext) -> Result<(), Error>;
}

/// Registration-ordered, kind-indexed subscriber table with a FIFO pending
/// queue — the "queueable" and "queryable" bus behaviors are the same
/// struct: queries (`subscribers_for`) are just a cached index over the
/// same `Vec`, queueing is just this struct's own pending buffer.
pub struct Bus {
    subscribers: Vec<Box<dyn Subscriber>>,
    index: HashMap<BroadcastKind, Vec<usize>>,
    pending: VecDeque<NodeId>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            index: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Registers a subscriber. Delivery order for a given kind is
    /// registration order.
    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        let kind = subscriber.kind();
        let idx = self.subscribers.len();
        self.subscribers.push(subscriber);
        self.index.entry(kind).or_default().push(idx);
    }

    /// Indices of subscribers registered for `kind`, in registration order.
    pub fn subscribers_for(&self, kind: BroadcastKind) -> &[usize] {
        self.index.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Broadcasts a single unit exactly once: transitions its status from
    /// `Unbroadcasted` to `Broadcasted` and notifies every matching
    /// subscriber in registration order. A unit that already `has_broadcast`
    /// is left alone — rework happens by creating fresh units and requeuing
    /// those through `BroadcastContext::requeue`, not by redelivering to a
    /// unit that already had its turn.
    pub fn broadcast(&mut self, arena: &mut AstArena, refinement: &RefinementRegistry, unit: NodeId) -> Result<(), Error> {
        let kind = match arena.get(unit) {
            Some(node) => {
                if node.value().status.has_broadcast() {
                    return Ok(());
                }
                BroadcastKind::of(&node.value().data)
            }
            None => return Ok(()),
        };
        arena.set_status(unit, Status::Broadcasted);

        let indices = self.subscribers_for(kind).to_vec();
        for idx in indices {
            let mut ctx = BroadcastContext {
                arena,
                refinement,
                unit,
                pending: &mut self.pending,
            };
            self.subscribers[idx].on_broadcast(&mut ctx)?;
        }
        Ok(())
    }

    /// Drains follow-up broadcasts queued by subscribers via
    /// `BroadcastContext::requeue`, FIFO, until none remain.
    pub fn drain_pending(&mut self, arena: &mut AstArena, refinement: &RefinementRegistry) -> Result<(), Error> {
        while let Some(unit) = self.pending.pop_front() {
            self.broadcast(arena, refinement, unit)?;
        }
        Ok(())
    }

    /// Broadcasts `unit`, then recursively propagates to every child in
    /// order — how a composite unit (Stylesheet, Rule, AtRule with a block)
    /// cascades broadcast to its members.
    pub fn propagate_broadcast(&mut self, arena: &mut AstArena, refinement: &RefinementRegistry, unit: NodeId) -> Result<(), Error> {
        self.broadcast(arena, refinement, unit)?;
        let children = arena.children(unit);
        for child in children {
            self.propagate_broadcast(arena, refinement, child)?;
        }
        self.drain_pending(arena, refinement)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
