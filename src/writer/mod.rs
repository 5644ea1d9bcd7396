//! Stylesheet writer — three output modes, each unit deciding its own
//! formatting; units marked not writable are skipped.
//!
//! Config-driven rendering: a small settings struct (`WriteMode`) plus a
//! visitor (`Writer`) that reads it and decides separators per unit kind.
//!
//! Refinement happens here, lazily, one unit at a time, right before that
//! unit is rendered — the writer is the consumer that drives it, the same
//! way a `PluginSubscriber` forces refinement on a unit it is about to
//! inspect. Nothing refines a unit the output never visits.

use std::fmt::Write as _;

use crate::ast::node::{AstNodeData, Combinator, PropertyNameData, PropertyValueData};
use crate::ast::term::{Operator, Quoting, Term, ValueMember};
use crate::ast::{AstArena, Stylesheet};
use crate::error::{Error, ErrorManager};
use crate::refine::RefinementRegistry;
use ego_tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// One declaration per line, indented blocks, comments preserved.
    Verbose,
    /// One rule per line, spaces around braces/colons, comments preserved.
    Inline,
    /// No optional whitespace, no comments, trailing semicolons dropped.
    Compressed,
}

/// Bundles what every writer method needs to force refinement on demand and
/// surface the errors that come out of it, threaded through instead of
/// carried on `Writer` itself since a `&Writer` is shared across a render
/// while these are per-call.
struct WriteContext<'a> {
    registry: &'a RefinementRegistry,
    error_manager: &'a ErrorManager,
    collected: &'a mut Vec<Error>,
}

impl<'a> WriteContext<'a> {
    fn refine(&mut self, arena: &mut AstArena, unit: NodeId) -> Result<(), Error> {
        if let Err(err) = self.registry.refine(arena, unit) {
            self.error_manager.report(err, self.collected)?;
        }
        Ok(())
    }
}

pub struct Writer {
    mode: WriteMode,
}

impl Writer {
    pub fn new(mode: WriteMode) -> Self {
        Self { mode }
    }

    pub fn write_stylesheet(
        &self,
        sheet: &mut Stylesheet,
        registry: &RefinementRegistry,
        error_manager: &ErrorManager,
        collected: &mut Vec<Error>,
    ) -> Result<String, Error> {
        let mut ctx = WriteContext { registry, error_manager, collected };
        let mut out = String::new();
        let root = sheet.root();
        self.write_children(&mut sheet.arena, root, 0, &mut ctx, &mut out)?;
        Ok(out)
    }

    fn write_children(&self, arena: &mut AstArena, parent: NodeId, depth: usize, ctx: &mut WriteContext, out: &mut String) -> Result<(), Error> {
        for (i, child) in arena.children(parent).into_iter().enumerate() {
            if i > 0 && self.mode != WriteMode::Compressed {
                out.push('\n');
            }
            self.write_unit(arena, child, depth, ctx, out)?;
        }
        Ok(())
    }

    fn write_unit(&self, arena: &mut AstArena, id: NodeId, depth: usize, ctx: &mut WriteContext, out: &mut String) -> Result<(), Error> {
        ctx.refine(arena, id)?;
        if !arena.is_writable(id) {
            return Ok(());
        }
        let (comments, data) = match arena.get(id) {
            Some(n) => (n.value().comments.clone(), n.value().data.clone()),
            None => return Ok(()),
        };

        self.write_comments(&comments, depth, out);

        match &data {
            AstNodeData::Stylesheet => self.write_children(arena, id, depth, ctx, out)?,
            AstNodeData::Rule => self.write_rule(arena, id, depth, ctx, out)?,
            AstNodeData::AtRule(d) => self.write_at_rule(arena, id, d.has_block, &d.name, &d.prelude_raw, depth, ctx, out)?,
            AstNodeData::SelectorGroup(d) => {
                for child in arena.children(id) {
                    ctx.refine(arena, child)?;
                }
                out.push_str(&d.raw);
            }
            AstNodeData::SelectorPart(d) => self.write_selector_part(d, out),
            AstNodeData::Declaration(d) => self.write_declaration(arena, id, d, ctx, out)?,
            AstNodeData::PropertyName(d) => self.write_property_name(d, out),
            AstNodeData::PropertyValue(d) => self.write_property_value(d, out),
        }
        Ok(())
    }

    fn write_comments(&self, comments: &[crate::ast::node::Comment], depth: usize, out: &mut String) {
        if self.mode == WriteMode::Compressed {
            return;
        }
        for comment in comments {
            self.indent(depth, out);
            let _ = write!(out, "/*{}*/", comment.text);
            out.push('\n');
        }
    }

    fn indent(&self, depth: usize, out: &mut String) {
        if self.mode == WriteMode::Verbose {
            for _ in 0..depth {
                out.push_str("  ");
            }
        }
    }

    fn write_rule(&self, arena: &mut AstArena, id: NodeId, depth: usize, ctx: &mut WriteContext, out: &mut String) -> Result<(), Error> {
        self.indent(depth, out);
        let children = arena.children(id);
        let selector_groups: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|c| matches!(arena.get(*c).map(|n| n.value().data.kind_name()), Some("SelectorGroup")))
            .filter(|c| arena.is_writable(*c))
            .collect();
        let declarations: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|c| matches!(arena.get(*c).map(|n| n.value().data.kind_name()), Some("Declaration")))
            .collect();

        for (i, group) in selector_groups.iter().enumerate() {
            if i > 0 {
                out.push(',');
                if self.mode != WriteMode::Compressed {
                    out.push(' ');
                }
            }
            self.write_unit(arena, *group, depth, ctx, out)?;
        }
        self.write_block_open(out);
        self.write_declarations(arena, &declarations, depth + 1, ctx, out)?;
        self.write_block_close(depth, out);
        Ok(())
    }

    fn write_at_rule(
        &self,
        arena: &mut AstArena,
        id: NodeId,
        has_block: bool,
        name: &str,
        prelude: &str,
        depth: usize,
        ctx: &mut WriteContext,
        out: &mut String,
    ) -> Result<(), Error> {
        self.indent(depth, out);
        out.push('@');
        out.push_str(name);
        if !prelude.is_empty() {
            out.push(' ');
            out.push_str(prelude);
        }
        if !has_block {
            out.push(';');
            return Ok(());
        }
        self.write_block_open(out);

        let children = arena.children(id);
        let has_nested_rules = children
            .iter()
            .any(|c| matches!(arena.get(*c).map(|n| n.value().data.kind_name()), Some("Rule") | Some("AtRule")));

        if has_nested_rules {
            self.write_children(arena, id, depth + 1, ctx, out)?;
            if self.mode != WriteMode::Compressed {
                out.push('\n');
            }
        } else {
            self.write_declarations(arena, &children, depth + 1, ctx, out)?;
        }
        self.write_block_close(depth, out);
        Ok(())
    }

    fn write_block_open(&self, out: &mut String) {
        match self.mode {
            WriteMode::Verbose => out.push_str(" {\n"),
            WriteMode::Inline => out.push_str(" { "),
            WriteMode::Compressed => out.push('{'),
        }
    }

    fn write_block_close(&self, depth: usize, out: &mut String) {
        match self.mode {
            WriteMode::Verbose => {
                self.indent(depth, out);
                out.push('}');
            }
            WriteMode::Inline => out.push('}'),
            WriteMode::Compressed => out.push('}'),
        }
    }

    /// Refines every candidate declaration up front, since a composite's
    /// writability depends on its (post-refine) children existing, then
    /// filters to what's actually writable before laying out separators.
    fn write_declarations(&self, arena: &mut AstArena, declarations: &[NodeId], depth: usize, ctx: &mut WriteContext, out: &mut String) -> Result<(), Error> {
        for decl in declarations {
            ctx.refine(arena, *decl)?;
        }
        let writable: Vec<NodeId> = declarations.iter().copied().filter(|d| arena.is_writable(*d)).collect();
        for (i, decl) in writable.iter().enumerate() {
            self.indent(depth, out);
            self.write_unit(arena, *decl, depth, ctx, out)?;
            let is_last = i + 1 == writable.len();
            if !is_last || self.mode != WriteMode::Compressed {
                out.push(';');
            }
            match self.mode {
                WriteMode::Verbose => out.push('\n'),
                WriteMode::Inline if !is_last => out.push(' '),
                _ => {}
            }
        }
        Ok(())
    }

    /// A Declaration renders from its refined PropertyName/PropertyValue
    /// children when present — necessary so plugin rework (e.g. a
    /// vendor-prefix mirror that edits the PropertyValue in place) is
    /// reflected in output instead of the stale raw text. Falls back to the
    /// raw text for unrefined declarations. `write_declarations` already
    /// guarantees every child here is writable if this call happens at all.
    fn write_declaration(&self, arena: &mut AstArena, id: NodeId, data: &crate::ast::node::DeclarationData, ctx: &mut WriteContext, out: &mut String) -> Result<(), Error> {
        if !data.refined {
            out.push_str(&data.raw);
            return Ok(());
        }
        for child in arena.children(id) {
            self.write_unit(arena, child, 0, ctx, out)?;
        }
        Ok(())
    }

    fn write_selector_part(&self, data: &crate::ast::node::SelectorPartData, out: &mut String) {
        match data.combinator {
            Some(Combinator::Descendant) => out.push(' '),
            Some(Combinator::Child) => out.push_str(if self.mode == WriteMode::Compressed { ">" } else { " > " }),
            Some(Combinator::AdjacentSibling) => out.push_str(if self.mode == WriteMode::Compressed { "+" } else { " + " }),
            Some(Combinator::GeneralSibling) => out.push_str(if self.mode == WriteMode::Compressed { "~" } else { " ~ " }),
            None => {}
        }
        out.push_str(&data.raw);
    }

    fn write_property_name(&self, data: &PropertyNameData, out: &mut String) {
        if let Some(prefix) = &data.vendor_prefix {
            out.push_str(prefix);
            out.push('-');
        }
        out.push_str(&data.name);
        out.push(':');
        if self.mode != WriteMode::Compressed {
            out.push(' ');
        }
    }

    fn write_property_value(&self, data: &PropertyValueData, out: &mut String) {
        for member in &data.members {
            match member {
                ValueMember::Term(term) => self.write_term(term, out),
                ValueMember::Operator(Operator::Comma) => {
                    out.push(',');
                    if self.mode != WriteMode::Compressed {
                        out.push(' ');
                    }
                }
                ValueMember::Operator(Operator::Slash) => out.push('/'),
                ValueMember::Operator(Operator::Space) => out.push(' '),
            }
        }
        if data.important {
            out.push_str(if self.mode == WriteMode::Compressed { "!important" } else { " !important" });
        }
    }

    fn write_term(&self, term: &Term, out: &mut String) {
        match term {
            Term::Keyword(k) => out.push_str(k),
            Term::Numeric { value, unit } => {
                out.push_str(value);
                if let Some(u) = unit {
                    out.push_str(u);
                }
            }
            Term::StringTerm { quoting, content } => {
                let q = match quoting {
                    Quoting::Double => '"',
                    Quoting::Single => '\'',
                };
                out.push(q);
                out.push_str(content);
                out.push(q);
            }
            Term::HexColor(hex) => out.push_str(hex),
            Term::Function { name, raw_args } => {
                let _ = write!(out, "{name}({raw_args})");
            }
            Term::Url(url) => {
                let _ = write!(out, "url({url})");
            }
            Term::UnquotedIeFilter(raw) => out.push_str(raw),
        }
    }
}
