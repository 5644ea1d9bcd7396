//! Selector refinement: splitting a selector group into combinator-joined
//! parts, then extracting pseudo-class/pseudo-element clauses from each part.

use ego_tree::NodeId;

use crate::ast::node::{AstNode, AstNodeData, Combinator, PseudoClause, SelectorPartData};
use crate::ast::AstArena;
use crate::bus::BroadcastKind;
use crate::cursor::SourcePosition;
use crate::error::{Error, ErrorKind};
use crate::refine::Refiner;

pub struct StandardSelectorGroupRefiner;

impl Refiner for StandardSelectorGroupRefiner {
    fn kind(&self) -> BroadcastKind {
        BroadcastKind::SelectorGroup
    }

    fn try_refine(&self, arena: &mut AstArena, unit: NodeId) -> Result<bool, Error> {
        let (raw, position) = match arena.get(unit) {
            Some(node) => match &node.value().data {
                AstNodeData::SelectorGroup(d) => (d.raw.clone(), node.value().position),
                _ => return Ok(false),
            },
            None => return Ok(false),
        };

        for (raw_part, combinator) in split_compound_selectors(&raw) {
            let data = SelectorPartData {
                raw: raw_part,
                combinator,
                pseudo_clauses: Vec::new(),
                refined: false,
            };
            arena.append_child(unit, AstNode::new(AstNodeData::SelectorPart(data), position));
        }

        if let Some(mut node) = arena.get_mut(unit) {
            node.value().data.mark_refined();
        }
        Ok(true)
    }
}

/// Splits `"div > p.foo  span"` into
/// `[("div", None), ("p.foo", Some(Child)), ("span", Some(Descendant))]`,
/// tracking paren/bracket/quote depth so combinator characters inside e.g.
/// `:not(a > b)` are not mistaken for a top-level combinator.
fn split_compound_selectors(raw: &str) -> Vec<(String, Option<Combinator>)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut pending_combinator: Option<Combinator> = None;
    let mut depth: i32 = 0;
    let mut in_quote: Option<char> = None;
    let mut chars = raw.chars().peekable();

    macro_rules! flush {
        () => {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                parts.push((trimmed.to_string(), pending_combinator.take()));
                current.clear();
            }
        };
    }

    while let Some(ch) = chars.next() {
        if let Some(q) = in_quote {
            current.push(ch);
            if ch == q {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                in_quote = Some(ch);
                current.push(ch);
            }
            '(' | '[' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' => {
                depth -= 1;
                current.push(ch);
            }
            '>' | '+' | '~' if depth == 0 => {
                flush!();
                pending_combinator = Some(match ch {
                    '>' => Combinator::Child,
                    '+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                });
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.trim().is_empty() {
                    flush!();
                    if pending_combinator.is_none() && !parts.is_empty() {
                        pending_combinator = Some(Combinator::Descendant);
                    }
                }
            }
            _ => current.push(ch),
        }
    }
    flush!();
    parts
}

pub struct StandardSelectorPartRefiner;

impl Refiner for StandardSelectorPartRefiner {
    fn kind(&self) -> BroadcastKind {
        BroadcastKind::SelectorPart
    }

    fn try_refine(&self, arena: &mut AstArena, unit: NodeId) -> Result<bool, Error> {
        let (raw, position) = match arena.get(unit) {
            Some(node) => match &node.value().data {
                AstNodeData::SelectorPart(d) => (d.raw.clone(), node.value().position),
                _ => return Ok(false),
            },
            None => return Ok(false),
        };

        let clauses = extract_pseudo_clauses(&raw, position)?;

        if let Some(mut node) = arena.get_mut(unit) {
            if let AstNodeData::SelectorPart(d) = &mut node.value().data {
                d.pseudo_clauses = clauses;
            }
            node.value().data.mark_refined();
        }
        Ok(true)
    }
}

/// Known legacy pseudo-elements that may be written with a single colon
/// (`:before`, `:after`, `:first-line`, `:first-letter`) for backward
/// compatibility, even though CSS3 otherwise reserves double-colon for
/// pseudo-elements.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

fn extract_pseudo_clauses(raw: &str, position: SourcePosition) -> Result<Vec<PseudoClause>, Error> {
    let mut clauses = Vec::new();
    let bytes: Vec<char> = raw.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != ':' {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        let mut is_element = false;
        if bytes.get(j) == Some(&':') {
            is_element = true;
            j += 1;
        }
        let name_start = j;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == '-') {
            j += 1;
        }
        if j == name_start {
            return Err(Error::new(
                position.line.max(1) as usize,
                position.column.max(1) as usize,
                ErrorKind::MissingPseudoName,
                "pseudo clause has no name",
            ));
        }
        let name: String = bytes[name_start..j].iter().collect();
        let element = is_element || LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str());

        let mut args = None;
        if bytes.get(j) == Some(&'(') {
            let mut depth = 1;
            let arg_start = j + 1;
            let mut k = arg_start;
            while k < bytes.len() && depth > 0 {
                match bytes[k] {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                k += 1;
            }
            if depth != 0 {
                return Err(Error::new(
                    position.line.max(1) as usize,
                    position.column.max(1) as usize,
                    ErrorKind::UnclosedParen,
                    "unclosed pseudo-class argument list",
                ));
            }
            args = Some(bytes[arg_start..k - 1].iter().collect());
            j = k;
        }

        clauses.push(PseudoClause {
            name,
            args,
            is_element: element,
        });
        i = j;
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_combinators_and_descendant_whitespace() {
        let parts = split_compound_selectors("div > p.foo  span");
        assert_eq!(
            parts,
            vec![
                ("div".to_string(), None),
                ("p.foo".to_string(), Some(Combinator::Child)),
                ("span".to_string(), Some(Combinator::Descendant)),
            ]
        );
    }

    #[test]
    fn combinator_inside_pseudo_args_is_not_a_split_point() {
        let parts = split_compound_selectors("div:not(a > b)");
        assert_eq!(parts, vec![("div:not(a > b)".to_string(), None)]);
    }

    #[test]
    fn nth_child_args_are_captured_balanced() {
        let clauses = extract_pseudo_clauses("li:nth-child(2n+1)", SourcePosition::new(1, 1)).unwrap();
        assert_eq!(clauses[0].name, "nth-child");
        assert_eq!(clauses[0].args.as_deref(), Some("2n+1"));
        assert!(!clauses[0].is_element);
    }

    #[test]
    fn legacy_single_colon_before_is_treated_as_element() {
        let clauses = extract_pseudo_clauses(":before", SourcePosition::new(1, 1)).unwrap();
        assert!(clauses[0].is_element);
    }

    #[test]
    fn lone_colon_is_missing_pseudo_name() {
        let err = extract_pseudo_clauses("div:", SourcePosition::new(3, 4)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingPseudoName);
    }
}
