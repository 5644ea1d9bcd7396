//! Declaration refinement: `name: value [!important]` splitting, vendor
//! prefix extraction, and value-term parsing.

use ego_tree::NodeId;

use crate::ast::node::{AstNode, AstNodeData, DeclarationData, PropertyNameData, PropertyValueData};
use crate::ast::term::{Operator, Quoting, Term, ValueMember};
use crate::ast::AstArena;
use crate::bus::BroadcastKind;
use crate::cursor::SourceCursor;
use crate::error::{Error, ErrorKind};
use crate::refine::Refiner;

pub struct StandardDeclarationRefiner;

impl Refiner for StandardDeclarationRefiner {
    fn kind(&self) -> BroadcastKind {
        BroadcastKind::Declaration
    }

    fn try_refine(&self, arena: &mut AstArena, unit: NodeId) -> Result<bool, Error> {
        let (raw, position) = match arena.get(unit) {
            Some(node) => match &node.value().data {
                AstNodeData::Declaration(DeclarationData { raw, .. }) => (raw.clone(), node.value().position),
                _ => return Ok(false),
            },
            None => return Ok(false),
        };

        let line = position.line.max(1) as usize;
        let column = position.column.max(1) as usize;

        let colon = raw.find(':').ok_or_else(|| {
            Error::new(line, column, ErrorKind::MissingColon, "declaration has no ':'")
        })?;
        let name_raw = raw[..colon].trim();
        let value_raw = raw[colon + 1..].trim();

        if name_raw.is_empty() {
            return Err(Error::new(line, column, ErrorKind::MalformedDeclaration, "empty property name"));
        }
        if value_raw.is_empty() {
            return Err(Error::new(line, column, ErrorKind::MissingValue, "declaration has no value"));
        }

        let (vendor_prefix, name) = split_vendor_prefix(name_raw);
        let name_data = PropertyNameData {
            name: name.to_string(),
            vendor_prefix,
        };

        let (important, value_body) = split_important(value_raw);
        let members = parse_value_members(value_body, line, column)?;
        let value_data = PropertyValueData { members, important };

        arena.append_child(unit, AstNode::new(AstNodeData::PropertyName(name_data), position));
        arena.append_child(unit, AstNode::new(AstNodeData::PropertyValue(value_data), position));

        if let Some(mut node) = arena.get_mut(unit) {
            node.value().data.mark_refined();
        }
        Ok(true)
    }
}

/// Claims `filter`/`-ms-filter` declarations whose value is an unquoted
/// legacy IE `progid:...(...)` filter, ahead of `StandardDeclarationRefiner`
/// in the registry — the standard term parser has no notion of this
/// syntax, so it is a dedicated strategy rather than a special case buried
/// in `parse_value_members`.
pub struct IeFilterDeclarationRefiner;

impl Refiner for IeFilterDeclarationRefiner {
    fn kind(&self) -> BroadcastKind {
        BroadcastKind::Declaration
    }

    fn try_refine(&self, arena: &mut AstArena, unit: NodeId) -> Result<bool, Error> {
        let (raw, position) = match arena.get(unit) {
            Some(node) => match &node.value().data {
                AstNodeData::Declaration(DeclarationData { raw, .. }) => (raw.clone(), node.value().position),
                _ => return Ok(false),
            },
            None => return Ok(false),
        };

        let Some(colon) = raw.find(':') else { return Ok(false) };
        let name_raw = raw[..colon].trim();
        let value_raw = raw[colon + 1..].trim();
        if name_raw.is_empty() || value_raw.is_empty() {
            return Ok(false);
        }

        let (vendor_prefix, name) = split_vendor_prefix(name_raw);
        if !is_ie_filter_property(name) {
            return Ok(false);
        }

        let (important, value_body) = split_important(value_raw);
        if !value_body.trim_start().to_ascii_lowercase().starts_with("progid:") {
            return Ok(false);
        }

        let name_data = PropertyNameData {
            name: name.to_string(),
            vendor_prefix,
        };
        let value_data = PropertyValueData {
            members: vec![ValueMember::Term(Term::UnquotedIeFilter(value_body.trim().to_string()))],
            important,
        };

        arena.append_child(unit, AstNode::new(AstNodeData::PropertyName(name_data), position));
        arena.append_child(unit, AstNode::new(AstNodeData::PropertyValue(value_data), position));

        if let Some(mut node) = arena.get_mut(unit) {
            node.value().data.mark_refined();
        }
        Ok(true)
    }
}

fn split_vendor_prefix(name: &str) -> (Option<String>, &str) {
    const PREFIXES: &[&str] = &["-webkit-", "-moz-", "-ms-", "-o-"];
    for prefix in PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            return (Some(prefix.trim_end_matches('-').to_string()), rest);
        }
    }
    (None, name)
}

fn split_important(value: &str) -> (bool, &str) {
    let lower = value.to_ascii_lowercase();
    if let Some(idx) = lower.rfind('!') {
        let marker = lower[idx + 1..].trim();
        if marker == "important" {
            return (true, value[..idx].trim_end());
        }
    }
    (false, value)
}

/// A handful of property names whose unquoted legacy IE filter syntax
/// (`progid:DXImageTransform...(...)`) is claimed whole by
/// `IeFilterDeclarationRefiner` rather than tokenized as ordinary
/// comma/space-separated terms.
fn is_ie_filter_property(name: &str) -> bool {
    name.eq_ignore_ascii_case("filter") || name.eq_ignore_ascii_case("-ms-filter")
}

fn parse_value_members(value: &str, line: usize, column: usize) -> Result<Vec<ValueMember>, Error> {
    let mut members = Vec::new();
    let mut cursor = SourceCursor::new(value);
    loop {
        cursor.skip_whitespace();
        if cursor.eof() {
            break;
        }
        match cursor.peek() {
            Some(',') => {
                cursor.advance();
                members.push(ValueMember::Operator(Operator::Comma));
                continue;
            }
            Some('/') => {
                cursor.advance();
                members.push(ValueMember::Operator(Operator::Slash));
                continue;
            }
            _ => {}
        }
        if !members.is_empty() && matches!(members.last(), Some(ValueMember::Term(_))) {
            members.push(ValueMember::Operator(Operator::Space));
        }
        members.push(ValueMember::Term(parse_term(&mut cursor, line, column)?));
    }
    Ok(members)
}

fn parse_term(cursor: &mut SourceCursor, line: usize, column: usize) -> Result<Term, Error> {
    match cursor.peek() {
        Some('#') => {
            cursor.advance();
            let hex = cursor.consume_while(|c| c.is_ascii_hexdigit());
            if !matches!(hex.len(), 3 | 4 | 6 | 8) {
                return Err(Error::new(line, column, ErrorKind::InvalidHexColor, format!("'#{hex}' is not a valid hex color")));
            }
            Ok(Term::HexColor(format!("#{hex}")))
        }
        Some('"') | Some('\'') => {
            let quote = cursor.peek().unwrap();
            let raw = cursor.read_string()?;
            let quoting = if quote == '"' { Quoting::Double } else { Quoting::Single };
            let content = raw[1..raw.len() - 1].to_string();
            Ok(Term::StringTerm { quoting, content })
        }
        Some(c) if c.is_ascii_digit() || ((c == '+' || c == '-') && cursor.peek_at(1).is_some_and(|n| n.is_ascii_digit() || n == '.')) => {
            let number = cursor.read_number().ok_or_else(|| {
                Error::new(line, column, ErrorKind::InvalidNumber, "malformed numeric term")
            })?;
            let unit = cursor.read_identifier();
            Ok(Term::Numeric { value: number, unit })
        }
        Some(_) => {
            let ident = cursor.read_identifier().ok_or_else(|| {
                Error::new(line, column, ErrorKind::MalformedDeclaration, "unrecognized value term")
            })?;
            if ident.eq_ignore_ascii_case("url") && cursor.peek() == Some('(') {
                cursor.advance();
                let url = cursor.consume_while(|c| c != ')');
                cursor.advance();
                Ok(Term::Url(url.trim_matches(|c| c == '"' || c == '\'').to_string()))
            } else if cursor.peek() == Some('(') {
                cursor.advance();
                let mut depth = 1;
                let mut args = String::new();
                while let Some(c) = cursor.advance() {
                    if c == '(' {
                        depth += 1;
                    } else if c == ')' {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    args.push(c);
                }
                Ok(Term::Function { name: ident, raw_args: args })
            } else {
                Ok(Term::Keyword(ident))
            }
        }
        None => Err(Error::new(line, column, ErrorKind::MissingValue, "expected a value term")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_vendor_prefix() {
        assert_eq!(split_vendor_prefix("-moz-box-sizing"), (Some("-moz".to_string()), "box-sizing"));
        assert_eq!(split_vendor_prefix("color"), (None, "color"));
    }

    #[test]
    fn detects_important_case_insensitively() {
        let (important, rest) = split_important("red !IMPORTANT");
        assert!(important);
        assert_eq!(rest, "red");
    }

    #[test]
    fn parses_comma_separated_terms() {
        let members = parse_value_members("Arial, sans-serif", 1, 1).unwrap();
        assert_eq!(members.len(), 3);
        assert!(matches!(members[1], ValueMember::Operator(Operator::Comma)));
    }

    #[test]
    fn invalid_hex_color_errors() {
        let err = parse_value_members("#ggg", 2, 5).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidHexColor);
    }

    fn declaration(raw: &str) -> (AstArena, NodeId) {
        let mut arena = AstArena::new();
        let root = arena.root_id();
        let id = arena
            .append_child(
                root,
                AstNode::new(AstNodeData::Declaration(DeclarationData { raw: raw.to_string(), refined: false }), crate::cursor::SourcePosition::new(1, 1)),
            )
            .unwrap();
        (arena, id)
    }

    #[test]
    fn ie_filter_refiner_claims_progid_value_whole() {
        let (mut arena, id) = declaration("filter: progid:DXImageTransform.Microsoft.gradient(x=1)");
        assert!(IeFilterDeclarationRefiner.try_refine(&mut arena, id).unwrap());
        let value_id = arena.children(id)[1];
        match &arena.get(value_id).unwrap().value().data {
            AstNodeData::PropertyValue(d) => assert!(matches!(&d.members[0], ValueMember::Term(Term::UnquotedIeFilter(_)))),
            _ => panic!("expected property value"),
        }
    }

    #[test]
    fn ie_filter_refiner_declines_ordinary_declarations() {
        let (mut arena, id) = declaration("color: red");
        assert!(!IeFilterDeclarationRefiner.try_refine(&mut arena, id).unwrap());
    }

    #[test]
    fn standard_refiner_still_parses_filter_values_that_are_not_progid() {
        let (mut arena, id) = declaration("filter: blur(2px)");
        assert!(!IeFilterDeclarationRefiner.try_refine(&mut arena, id).unwrap());
        assert!(StandardDeclarationRefiner.try_refine(&mut arena, id).unwrap());
    }
}
