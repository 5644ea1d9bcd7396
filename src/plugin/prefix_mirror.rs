//! Built-in rework plugin: mirrors an unprefixed declaration into
//! vendor-prefixed siblings per a `PrefixTable`, and a
//! companion that prunes prefixed declarations once a vendor no longer
//! needs them.

use ego_tree::NodeId;

use crate::ast::node::{AstNode, AstNodeData, DeclarationData, PropertyNameData, PropertyValueData, SelectorGroupData};
use crate::ast::Status;
use crate::bus::{BroadcastContext, BroadcastKind};
use crate::error::Error;
use crate::plugin::{Phase, Plugin, RefinementRequirement, Subscription};
use crate::prefix::{PrefixKind, PrefixTable};

pub struct PrefixMirrorPlugin<T: PrefixTable> {
    table: T,
}

impl<T: PrefixTable> PrefixMirrorPlugin<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }
}

impl<T: PrefixTable + 'static> Plugin for PrefixMirrorPlugin<T> {
    fn name(&self) -> &str {
        "prefix-mirror"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription {
            kind: BroadcastKind::PropertyName,
            phase: Phase::Rework,
            requirement: RefinementRequirement::Refined,
        }]
    }

    fn handle(&mut self, ctx: &mut BroadcastContext, _phase: Phase) -> Result<(), Error> {
        let (property_name, vendor_prefix) = match ctx.arena.get(ctx.unit) {
            Some(node) => match &node.value().data {
                AstNodeData::PropertyName(d) => (d.name.clone(), d.vendor_prefix.clone()),
                _ => return Ok(()),
            },
            None => return Ok(()),
        };
        if vendor_prefix.is_some() {
            return Ok(());
        }

        let Some(declaration_id) = ctx.arena.parent(ctx.unit) else { return Ok(()) };
        let Some(rule_id) = ctx.arena.parent(declaration_id) else { return Ok(()) };
        let position = ctx
            .arena
            .get(declaration_id)
            .map(|n| n.value().position)
            .unwrap_or(crate::cursor::SourcePosition::SYNTHESIZED);

        let value_id = ctx
            .arena
            .children(declaration_id)
            .into_iter()
            .find(|c| matches!(ctx.arena.get(*c).map(|n| n.value().data.clone()), Some(AstNodeData::PropertyValue(_))));
        let Some(value_id) = value_id else { return Ok(()) };
        let value_data = match ctx.arena.get(value_id) {
            Some(node) => match &node.value().data {
                AstNodeData::PropertyValue(d) => d.clone(),
                _ => return Ok(()),
            },
            None => return Ok(()),
        };

        let mut mirrored = Vec::new();
        for vendor in self.table.known_vendors() {
            if self.table.last_version_requiring_prefix(PrefixKind::Property, &property_name, vendor).is_none() {
                continue;
            }
            let mirrored_id = create_mirrored_declaration(ctx.arena, rule_id, vendor, &property_name, &value_data, position)?;
            mirrored.push(mirrored_id);
        }

        for id in mirrored {
            ctx.requeue(id);
        }
        Ok(())
    }
}

fn create_mirrored_declaration(
    arena: &mut crate::ast::AstArena,
    rule_id: NodeId,
    vendor: &str,
    property_name: &str,
    value_data: &PropertyValueData,
    position: crate::cursor::SourcePosition,
) -> Result<NodeId, Error> {
    let declaration_id = arena
        .append_child(rule_id, AstNode::new(AstNodeData::Declaration(DeclarationData { raw: String::new(), refined: true }), position))
        .ok_or_else(|| Error::new(0, 0, crate::error::ErrorKind::MalformedDeclaration, "arena append failed while mirroring declaration"))?;
    arena.append_child(
        declaration_id,
        AstNode::new(
            AstNodeData::PropertyName(PropertyNameData {
                name: property_name.to_string(),
                vendor_prefix: Some(format!("-{vendor}")),
            }),
            position,
        ),
    );
    arena.append_child(declaration_id, AstNode::new(AstNodeData::PropertyValue(value_data.clone()), position));
    Ok(declaration_id)
}

/// Removes a prefixed declaration's sibling once `table` says the vendor no
/// longer requires it for that property, by marking it `NeverEmit` rather
/// than detaching — preserves its place in iteration order for any plugin
/// still inspecting the Rule's children while leaving it out of writer
/// output.
pub struct PrefixPrunePlugin<T: PrefixTable> {
    table: T,
    min_supported_version: &'static str,
}

impl<T: PrefixTable> PrefixPrunePlugin<T> {
    pub fn new(table: T, min_supported_version: &'static str) -> Self {
        Self { table, min_supported_version }
    }
}

impl<T: PrefixTable + 'static> Plugin for PrefixPrunePlugin<T> {
    fn name(&self) -> &str {
        "prefix-prune"
    }

    fn dependencies(&self) -> Vec<&str> {
        vec!["prefix-mirror"]
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription {
            kind: BroadcastKind::PropertyName,
            phase: Phase::Validate,
            requirement: RefinementRequirement::Refined,
        }]
    }

    fn handle(&mut self, ctx: &mut BroadcastContext, _phase: Phase) -> Result<(), Error> {
        let Some((property_name, vendor)) = (match ctx.arena.get(ctx.unit) {
            Some(node) => match &node.value().data {
                AstNodeData::PropertyName(d) => d.vendor_prefix.clone().map(|v| (d.name.clone(), v)),
                _ => None,
            },
            None => None,
        }) else {
            return Ok(());
        };
        let vendor = vendor.trim_start_matches('-');
        let Some(last_required) = self.table.last_version_requiring_prefix(PrefixKind::Property, &property_name, vendor) else {
            return Ok(());
        };
        if last_required <= self.min_supported_version {
            if let Some(declaration_id) = ctx.arena.parent(ctx.unit) {
                ctx.arena.set_status(declaration_id, Status::NeverEmit);
            }
        }
        Ok(())
    }
}

/// Mirrors a rule whose selector ends in a prefixable pseudo-element
/// (`::selection`) into a vendor-prefixed sibling rule (`::-moz-selection`)
/// ahead of the original, per a `PrefixTable`. Unlike `PrefixMirrorPlugin`
/// this operates a level up: the unit to duplicate is the enclosing Rule,
/// not the declaration, since the prefix lives in the selector text rather
/// than a property name.
pub struct PseudoElementMirrorPlugin<T: PrefixTable> {
    table: T,
}

impl<T: PrefixTable> PseudoElementMirrorPlugin<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }
}

impl<T: PrefixTable + 'static> Plugin for PseudoElementMirrorPlugin<T> {
    fn name(&self) -> &str {
        "pseudo-element-mirror"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription {
            kind: BroadcastKind::SelectorPart,
            phase: Phase::Rework,
            requirement: RefinementRequirement::Refined,
        }]
    }

    fn handle(&mut self, ctx: &mut BroadcastContext, _phase: Phase) -> Result<(), Error> {
        let pseudo = match ctx.arena.get(ctx.unit) {
            Some(node) => match &node.value().data {
                AstNodeData::SelectorPart(d) => d.pseudo_clauses.iter().find(|c| c.is_element).cloned(),
                _ => return Ok(()),
            },
            None => return Ok(()),
        };
        let Some(pseudo) = pseudo else { return Ok(()) };

        let Some(group_id) = ctx.arena.parent(ctx.unit) else { return Ok(()) };
        let Some(rule_id) = ctx.arena.parent(group_id) else { return Ok(()) };

        let selector_raw = match ctx.arena.get(group_id) {
            Some(node) => match &node.value().data {
                AstNodeData::SelectorGroup(d) => d.raw.clone(),
                _ => return Ok(()),
            },
            None => return Ok(()),
        };
        let position = ctx
            .arena
            .get(rule_id)
            .map(|n| n.value().position)
            .unwrap_or(crate::cursor::SourcePosition::SYNTHESIZED);

        let declarations: Vec<NodeId> = ctx
            .arena
            .children(rule_id)
            .into_iter()
            .filter(|c| ctx.arena.get(*c).is_some_and(|n| n.value().data.kind_name() == "Declaration"))
            .collect();

        let mut mirrored_rules = Vec::new();
        for vendor in self.table.known_vendors() {
            if self.table.last_version_requiring_prefix(PrefixKind::PseudoElement, &pseudo.name, vendor).is_none() {
                continue;
            }
            let needle = format!("::{}", pseudo.name);
            if !selector_raw.contains(&needle) {
                continue;
            }
            let replacement = format!("::-{vendor}-{}", pseudo.name);
            let mirrored_raw = selector_raw.replacen(&needle, &replacement, 1);

            let new_rule_id = ctx
                .arena
                .insert_before(rule_id, AstNode::new(AstNodeData::Rule, position))
                .ok_or_else(|| Error::new(0, 0, crate::error::ErrorKind::MalformedDeclaration, "arena insert failed while mirroring pseudo-element rule"))?;
            ctx.arena.append_child(
                new_rule_id,
                AstNode::new(AstNodeData::SelectorGroup(SelectorGroupData { raw: mirrored_raw, refined: false }), position),
            );
            for decl_id in &declarations {
                clone_declaration_into(ctx.arena, new_rule_id, *decl_id, position)?;
            }
            mirrored_rules.push(new_rule_id);
        }

        for id in mirrored_rules {
            ctx.requeue(id);
        }
        Ok(())
    }
}

fn clone_declaration_into(arena: &mut crate::ast::AstArena, parent: NodeId, source_id: NodeId, position: crate::cursor::SourcePosition) -> Result<NodeId, Error> {
    let data = match arena.get(source_id) {
        Some(node) => match &node.value().data {
            AstNodeData::Declaration(d) => d.clone(),
            _ => return Err(Error::new(0, 0, crate::error::ErrorKind::MalformedDeclaration, "expected a declaration to clone")),
        },
        None => return Err(Error::new(0, 0, crate::error::ErrorKind::MalformedDeclaration, "declaration vanished while cloning")),
    };
    let new_id = arena
        .append_child(parent, AstNode::new(AstNodeData::Declaration(data), position))
        .ok_or_else(|| Error::new(0, 0, crate::error::ErrorKind::MalformedDeclaration, "arena append failed while cloning declaration"))?;
    for child in arena.children(source_id) {
        if let Some(child_data) = arena.get(child).map(|n| n.value().data.clone()) {
            arena.append_child(new_id, AstNode::new(child_data, position));
        }
    }
    Ok(new_id)
}
