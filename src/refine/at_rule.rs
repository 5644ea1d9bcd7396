//! At-rule refinement: dispatch by name, falling back to an advisory
//! "unknown at-rule" rather than a hard parse failure — an unrecognized
//! at-rule is still syntactically a stylesheet unit, just one this crate
//! doesn't specialize.

use ego_tree::NodeId;

use crate::ast::node::AstNodeData;
use crate::ast::AstArena;
use crate::bus::BroadcastKind;
use crate::error::{Error, ErrorKind};
use crate::refine::Refiner;

/// At-rule names this crate recognizes well enough to refine specially.
/// Everything else still parses (name + raw prelude + optional block) but
/// is reported via an advisory `UnknownAtRule` error.
const KNOWN_AT_RULES: &[&str] = &[
    "media", "import", "charset", "font-face", "keyframes", "-webkit-keyframes",
    "-moz-keyframes", "supports", "page", "namespace",
];

pub struct StandardAtRuleRefiner;

impl Refiner for StandardAtRuleRefiner {
    fn kind(&self) -> BroadcastKind {
        BroadcastKind::AtRule
    }

    fn try_refine(&self, arena: &mut AstArena, unit: NodeId) -> Result<bool, Error> {
        let (name, position) = match arena.get(unit) {
            Some(node) => match &node.value().data {
                AstNodeData::AtRule(d) => (d.name.clone(), node.value().position),
                _ => return Ok(false),
            },
            None => return Ok(false),
        };

        if let Some(mut node) = arena.get_mut(unit) {
            node.value().data.mark_refined();
        }

        if KNOWN_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) {
            return Ok(true);
        }

        Err(Error::new(
            position.line.max(1) as usize,
            position.column.max(1) as usize,
            ErrorKind::UnknownAtRule,
            format!("@{name} is not a recognized at-rule"),
        ))
    }
}
