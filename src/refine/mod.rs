//! Refinement registry — on-demand grammar validation.
//!
//! Raw parsing only splits source into units with their unparsed text
//! intact; a unit gains structured data only when something asks for it.
//! The registry holds an ordered list of strategies per refinable kind and
//! tries each in turn, first claim wins.

pub mod at_rule;
pub mod declaration;
pub mod selector;

use std::collections::HashMap;

use ego_tree::NodeId;

use crate::ast::AstArena;
use crate::bus::BroadcastKind;
use crate::error::Error;

/// A single refinement strategy for one unit kind. Returns `Ok(true)` if it
/// claimed and refined the unit, `Ok(false)` to let the next strategy try.
pub trait Refiner {
    fn kind(&self) -> BroadcastKind;
    fn try_refine(&self, arena: &mut AstArena, unit: NodeId) -> Result<bool, Error>;
}

pub struct RefinementRegistry {
    strategies: HashMap<BroadcastKind, Vec<Box<dyn Refiner>>>,
}

impl RefinementRegistry {
    /// Builds a registry with the standard refiner registered last for each
    /// refinable kind, so custom strategies registered afterward via
    /// `register` still run before it — the standard refiner is the
    /// fallback of last resort.
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(Box::new(selector::StandardSelectorGroupRefiner));
        registry.register(Box::new(selector::StandardSelectorPartRefiner));
        registry.register(Box::new(declaration::IeFilterDeclarationRefiner));
        registry.register(Box::new(declaration::StandardDeclarationRefiner));
        registry.register(Box::new(at_rule::StandardAtRuleRefiner));
        registry
    }

    pub fn register(&mut self, refiner: Box<dyn Refiner>) {
        self.strategies.entry(refiner.kind()).or_default().push(refiner);
    }

    /// Refines `unit` in place if it hasn't been refined already. No-op for
    /// non-refinable kinds or units with no registered strategy.
    pub fn refine(&self, arena: &mut AstArena, unit: NodeId) -> Result<(), Error> {
        let (kind, already_refined) = match arena.get(unit) {
            Some(node) => {
                if !node.value().data.is_refinable() {
                    return Ok(());
                }
                (BroadcastKind::of(&node.value().data), node.value().data.is_refined())
            }
            None => return Ok(()),
        };
        if already_refined {
            return Ok(());
        }
        let Some(strategies) = self.strategies.get(&kind) else {
            return Ok(());
        };
        for strategy in strategies {
            if strategy.try_refine(arena, unit)? {
                return Ok(());
            }
        }
        Ok(())
    }
}

impl Default for RefinementRegistry {
    fn default() -> Self {
        Self::new()
    }
}
