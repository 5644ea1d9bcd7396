//! Plugin protocol and scheduler.
//!
//! A small trait surface (name + subscriptions + lifecycle hooks) with a
//! registry that owns ordering, not the plugins themselves. Dependency
//! resolution and phase separation are layered on top so that plugins can
//! depend on each other's rework without knowing their registration order.

pub mod prefix_mirror;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{AstArena, Stylesheet};
use crate::bus::{Bus, BroadcastContext, BroadcastKind, Subscriber};
use crate::error::Error;
use crate::refine::RefinementRegistry;

/// The three moments a plugin may act within one broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PreProcess,
    Rework,
    Validate,
}

/// Whether a subscription requires its unit to already be refined before
/// the plugin sees it, or is happy to receive it as broadcast
///.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementRequirement {
    Automatic,
    Refined,
}

#[derive(Debug, Clone, Copy)]
pub struct Subscription {
    pub kind: BroadcastKind,
    pub phase: Phase,
    pub requirement: RefinementRequirement,
}

/// Something that observes and may mutate the AST as units broadcast.
/// Mirrors `PluginHost`'s "name + collection of contributions" shape, with
/// `handle` replacing `event_sources` as the thing the scheduler drains.
pub trait Plugin {
    fn name(&self) -> &str;
    fn subscriptions(&self) -> Vec<Subscription>;
    /// Names of plugins that must run before this one for a given unit.
    /// Empty by default (no ordering constraint).
    fn dependencies(&self) -> Vec<&str> {
        Vec::new()
    }
    fn before_pre_process(&mut self, _sheet: &mut Stylesheet) -> Result<(), Error> {
        Ok(())
    }
    fn after_pre_process(&mut self, _sheet: &mut Stylesheet) -> Result<(), Error> {
        Ok(())
    }
    fn handle(&mut self, ctx: &mut BroadcastContext, phase: Phase) -> Result<(), Error>;
}

struct PluginSubscriber {
    plugin: Rc<RefCell<dyn Plugin>>,
    subscription: Subscription,
}

impl Subscriber for PluginSubscriber {
    fn kind(&self) -> BroadcastKind {
        self.subscription.kind
    }

    fn on_broadcast(&mut self, ctx: &mut BroadcastContext) -> Result<(), Error> {
        if self.subscription.requirement == RefinementRequirement::Refined {
            ctx.refinement.refine(ctx.arena, ctx.unit)?;
        }
        self.plugin.borrow_mut().handle(ctx, self.subscription.phase)
    }
}

/// Owns the registered plugin set and runs the three-phase pipeline over a
/// stylesheet, in dependency-resolved, otherwise registration-stable order
///.
pub struct Scheduler {
    plugins: Vec<(String, Rc<RefCell<dyn Plugin>>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    pub fn register(&mut self, plugin: Rc<RefCell<dyn Plugin>>) {
        let name = plugin.borrow().name().to_string();
        self.plugins.push((name, plugin));
    }

    /// Topological sort by `dependencies()`, ties broken by registration
    /// order. A plugin naming an unregistered dependency is treated as
    /// having no such constraint (it simply runs in registration order
    /// relative to the missing name).
    fn resolve_order(&self) -> Vec<usize> {
        let name_to_index: HashMap<&str, usize> =
            self.plugins.iter().enumerate().map(|(i, (name, _))| (name.as_str(), i)).collect();

        let mut visited = vec![false; self.plugins.len()];
        let mut visiting = vec![false; self.plugins.len()];
        let mut order = Vec::with_capacity(self.plugins.len());

        fn visit(
            i: usize,
            plugins: &[(String, Rc<RefCell<dyn Plugin>>)],
            name_to_index: &HashMap<&str, usize>,
            visited: &mut Vec<bool>,
            visiting: &mut Vec<bool>,
            order: &mut Vec<usize>,
        ) {
            if visited[i] || visiting[i] {
                return;
            }
            visiting[i] = true;
            let deps = plugins[i].1.borrow().dependencies();
            for dep in deps {
                if let Some(&j) = name_to_index.get(dep) {
                    visit(j, plugins, name_to_index, visited, visiting, order);
                }
            }
            visiting[i] = false;
            visited[i] = true;
            order.push(i);
        }

        for i in 0..self.plugins.len() {
            visit(i, &self.plugins, &name_to_index, &mut visited, &mut visiting, &mut order);
        }
        order
    }

    /// Runs the full PreProcess → Rework → Validate pipeline over `sheet`.
    pub fn process(&mut self, sheet: &mut Stylesheet, refinement: &RefinementRegistry) -> Result<(), Error> {
        let order = self.resolve_order();

        for &i in &order {
            self.plugins[i].1.borrow_mut().before_pre_process(sheet)?;
        }

        self.run_phase(sheet, refinement, &order, Phase::PreProcess)?;
        self.run_phase(sheet, refinement, &order, Phase::Rework)?;
        self.run_phase(sheet, refinement, &order, Phase::Validate)?;

        for &i in &order {
            self.plugins[i].1.borrow_mut().after_pre_process(sheet)?;
        }
        Ok(())
    }

    fn run_phase(&self, sheet: &mut Stylesheet, refinement: &RefinementRegistry, order: &[usize], phase: Phase) -> Result<(), Error> {
        let mut bus = Bus::new();
        let mut any_subscribed = false;
        for &i in order {
            let plugin = self.plugins[i].1.clone();
            let subs: Vec<Subscription> = plugin.borrow().subscriptions().into_iter().filter(|s| s.phase == phase).collect();
            for subscription in subs {
                any_subscribed = true;
                bus.subscribe(Box::new(PluginSubscriber {
                    plugin: plugin.clone(),
                    subscription,
                }));
            }
        }
        if !any_subscribed {
            return Ok(());
        }
        let root = sheet.root();
        bus.propagate_broadcast(&mut sheet.arena, refinement, root)
    }

    /// Distinct plugin names with a subscription to `phase`, in scheduling
    /// order — used by callers that want to know what ran without
    /// re-deriving a bus (e.g. diagnostics, tests).
    pub fn plugins_for_phase(&self, phase: Phase) -> Vec<String> {
        self.resolve_order()
            .into_iter()
            .filter(|&i| self.plugins[i].1.borrow().subscriptions().iter().any(|s| s.phase == phase))
            .map(|i| self.plugins[i].0.clone())
            .collect()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A reusable detail for rework plugins: re-enqueues `unit` (and, when it
/// was newly created by rework, its freshly appended siblings) so the
/// Rework-phase bus broadcasts it again rather than leaving it unvisited
///.
pub fn requeue_siblings(ctx: &mut BroadcastContext, units: impl IntoIterator<Item = ego_tree::NodeId>) {
    for unit in units {
        ctx.requeue(unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::{AstNode, AstNodeData, PropertyNameData};
    use std::cell::RefCell as StdRefCell;

    struct RenamingPlugin {
        calls: Rc<StdRefCell<u32>>,
    }

    impl Plugin for RenamingPlugin {
        fn name(&self) -> &str {
            "renamer"
        }
        fn subscriptions(&self) -> Vec<Subscription> {
            vec![Subscription {
                kind: BroadcastKind::PropertyName,
                phase: Phase::PreProcess,
                requirement: RefinementRequirement::Automatic,
            }]
        }
        fn handle(&mut self, ctx: &mut BroadcastContext, _phase: Phase) -> Result<(), Error> {
            *self.calls.borrow_mut() += 1;
            if let Some(mut node) = ctx.arena.get_mut(ctx.unit) {
                if let AstNodeData::PropertyName(d) = &mut node.value().data {
                    d.name = d.name.to_uppercase();
                }
            }
            Ok(())
        }
    }

    #[test]
    fn scheduler_runs_preprocess_subscribers() {
        let mut sheet = Stylesheet::new();
        let root = sheet.root();
        sheet.arena.append_child(
            root,
            AstNode::synthesized(AstNodeData::PropertyName(PropertyNameData {
                name: "color".into(),
                vendor_prefix: None,
            })),
        );

        let calls = Rc::new(StdRefCell::new(0));
        let mut scheduler = Scheduler::new();
        scheduler.register(Rc::new(RefCell::new(RenamingPlugin { calls: calls.clone() })));

        let registry = RefinementRegistry::new();
        scheduler.process(&mut sheet, &registry).unwrap();

        assert_eq!(*calls.borrow(), 1);
        let prop = sheet.arena.children(root)[0];
        match &sheet.arena.get(prop).unwrap().value().data {
            AstNodeData::PropertyName(d) => assert_eq!(d.name, "COLOR"),
            _ => panic!("expected property name"),
        }
    }

    struct NamedPlugin(&'static str, Rc<StdRefCell<Vec<&'static str>>>, Vec<&'static str>);

    impl Plugin for NamedPlugin {
        fn name(&self) -> &str {
            self.0
        }
        fn dependencies(&self) -> Vec<&str> {
            self.2.clone()
        }
        fn subscriptions(&self) -> Vec<Subscription> {
            Vec::new()
        }
        fn before_pre_process(&mut self, _sheet: &mut Stylesheet) -> Result<(), Error> {
            self.1.borrow_mut().push(self.0);
            Ok(())
        }
        fn handle(&mut self, _ctx: &mut BroadcastContext, _phase: Phase) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn dependencies_force_ordering_before_registration_order() {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.register(Rc::new(RefCell::new(NamedPlugin("b", log.clone(), vec!["a"]))));
        scheduler.register(Rc::new(RefCell::new(NamedPlugin("a", log.clone(), vec![]))));

        let mut sheet = Stylesheet::new();
        let registry = RefinementRegistry::new();
        scheduler.process(&mut sheet, &registry).unwrap();

        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }
}
