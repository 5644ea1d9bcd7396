//! Top-level raw parser: source text → Stylesheet arena of Rule/AtRule
//! units with unrefined SelectorGroup/Declaration text.

use ego_tree::NodeId;

use crate::ast::node::{AstNode, AstNodeData, AtRuleData, Comment, DeclarationData, SelectorGroupData};
use crate::ast::{AstArena, Stylesheet};
use crate::cursor::{SourceCursor, SourcePosition};
use crate::error::{Error, ErrorKind};
use crate::raw::cursor_ext::{read_balanced, read_until_top_level};

/// Parses an entire stylesheet. Comments preceding a unit are attached to
/// that unit; comments with nothing left to attach to at EOF are kept on
/// `Stylesheet::orphaned_comments` rather than dropped.
pub fn parse_stylesheet(source: &str) -> Result<Stylesheet, Error> {
    let mut sheet = Stylesheet::new();
    let root = sheet.root();
    let mut cursor = SourceCursor::new(source);
    let mut pending_comments = Vec::new();

    loop {
        let skipped = skip_whitespace_and_comments(&mut cursor, &mut pending_comments)?;
        let _ = skipped;
        if cursor.eof() {
            break;
        }
        let id = if cursor.peek() == Some('@') {
            parse_at_rule(&mut sheet.arena, root, &mut cursor)?
        } else {
            parse_rule(&mut sheet.arena, root, &mut cursor)?
        };
        attach_comments(&mut sheet.arena, id, &mut pending_comments);
    }

    sheet.orphaned_comments = pending_comments;
    Ok(sheet)
}

fn attach_comments(arena: &mut AstArena, id: NodeId, pending: &mut Vec<Comment>) {
    if pending.is_empty() {
        return;
    }
    if let Some(mut node) = arena.get_mut(id) {
        node.value().comments.append(pending);
    }
}

/// Consumes whitespace and `/* ... */` comments, collecting comments into
/// `pending` in source order. Returns the number of comments collected.
fn skip_whitespace_and_comments(cursor: &mut SourceCursor, pending: &mut Vec<Comment>) -> Result<usize, Error> {
    let mut count = 0;
    loop {
        cursor.skip_whitespace();
        if cursor.peek() == Some('/') && cursor.peek_at(1) == Some('*') {
            let start = cursor.position();
            cursor.advance();
            cursor.advance();
            let text = read_comment_body(cursor, start)?;
            pending.push(Comment { text, position: start });
            count += 1;
            continue;
        }
        break;
    }
    Ok(count)
}

fn read_comment_body(cursor: &mut SourceCursor, start: SourcePosition) -> Result<String, Error> {
    let mut out = String::new();
    loop {
        match cursor.peek() {
            None => {
                return Err(Error::new(
                    start.line.max(1) as usize,
                    start.column.max(1) as usize,
                    ErrorKind::UnclosedBlock,
                    "unterminated comment",
                ));
            }
            Some('*') if cursor.peek_at(1) == Some('/') => {
                cursor.advance();
                cursor.advance();
                return Ok(out);
            }
            Some(c) => {
                out.push(c);
                cursor.advance();
            }
        }
    }
}

fn parse_at_rule(arena: &mut AstArena, parent: NodeId, cursor: &mut SourceCursor) -> Result<NodeId, Error> {
    let start = cursor.position();
    cursor.advance(); // '@'
    let name = cursor.read_identifier().ok_or_else(|| {
        Error::new(start.line.max(1) as usize, start.column.max(1) as usize, ErrorKind::MalformedDeclaration, "expected an at-rule name after '@'")
    })?;
    cursor.skip_whitespace();
    let (prelude, terminator) = read_until_top_level(cursor, &['{', ';']);
    let prelude_raw = prelude.trim().to_string();

    let has_block = terminator == Some('{');
    let data = AtRuleData {
        name,
        prelude_raw,
        has_block,
        refined: false,
    };
    let id = arena.append_child(parent, AstNode::new(AstNodeData::AtRule(data), start)).ok_or_else(|| {
        Error::new(start.line.max(1) as usize, start.column.max(1) as usize, ErrorKind::MalformedDeclaration, "arena append failed")
    })?;

    match terminator {
        Some(';') => {
            cursor.advance();
        }
        Some('{') => {
            cursor.advance();
            let body = read_balanced(cursor, '{', '}', ErrorKind::UnclosedBlock)?;
            parse_at_rule_block(arena, id, &body)?;
        }
        None => {
            return Err(Error::new(
                start.line.max(1) as usize,
                start.column.max(1) as usize,
                ErrorKind::UnclosedBlock,
                "at-rule has no terminating ';' or block",
            ));
        }
        Some(_) => unreachable!(),
    }
    Ok(id)
}

/// An at-rule block either nests further rules (e.g. `@media`) or is a flat
/// declaration list (e.g. `@font-face`). Distinguished by whether a
/// top-level `{` appears inside before the first top-level `;`.
fn parse_at_rule_block(arena: &mut AstArena, at_rule_id: NodeId, body: &str) -> Result<(), Error> {
    let mut probe = SourceCursor::new(body);
    let mut pending = Vec::new();
    skip_whitespace_and_comments(&mut probe, &mut pending)?;
    let looks_nested = !probe.eof() && {
        let (_, terminator) = read_until_top_level(&mut probe, &['{', ';']);
        terminator == Some('{')
    };

    if looks_nested {
        let nested = parse_stylesheet(body)?;
        for child in nested.arena.children(nested.root()) {
            reparent_subtree(&nested.arena, child, arena, at_rule_id)?;
        }
        return Ok(());
    }

    let mut cursor = SourceCursor::new(body);
    let mut pending_comments = Vec::new();
    loop {
        skip_whitespace_and_comments(&mut cursor, &mut pending_comments)?;
        if cursor.eof() {
            break;
        }
        let decl_start = cursor.position();
        let (raw, _terminator) = read_until_top_level(&mut cursor, &[';']);
        if cursor.peek() == Some(';') {
            cursor.advance();
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let data = DeclarationData { raw: trimmed.to_string(), refined: false };
        let id = arena
            .append_child(at_rule_id, AstNode::new(AstNodeData::Declaration(data), decl_start))
            .ok_or_else(|| Error::new(decl_start.line.max(1) as usize, decl_start.column.max(1) as usize, ErrorKind::MalformedDeclaration, "arena append failed"))?;
        attach_comments(arena, id, &mut pending_comments);
    }
    Ok(())
}

/// Copies a subtree from one arena into another as a child of `dest_parent`,
/// giving every copied unit fresh identity (same guarantee as
/// `AstArena::deep_copy`, just across two already-live arenas).
fn reparent_subtree(src: &AstArena, src_id: NodeId, dest: &mut AstArena, dest_parent: NodeId) -> Result<(), Error> {
    let node = src
        .get(src_id)
        .ok_or_else(|| Error::new(0, 0, ErrorKind::MalformedDeclaration, "subtree root missing during reparent"))?
        .value()
        .clone();
    let new_id = dest
        .append_child(dest_parent, node)
        .ok_or_else(|| Error::new(0, 0, ErrorKind::MalformedDeclaration, "arena append failed during reparent"))?;
    for child in src.children(src_id) {
        reparent_subtree(src, child, dest, new_id)?;
    }
    Ok(())
}

fn parse_rule(arena: &mut AstArena, parent: NodeId, cursor: &mut SourceCursor) -> Result<NodeId, Error> {
    let start = cursor.position();
    let (selector_raw, terminator) = read_until_top_level(cursor, &['{']);
    if terminator != Some('{') {
        return Err(Error::new(
            start.line.max(1) as usize,
            start.column.max(1) as usize,
            ErrorKind::UnclosedBlock,
            "rule is missing its opening '{'",
        ));
    }
    cursor.advance();
    let body = read_balanced(cursor, '{', '}', ErrorKind::UnclosedBlock)?;

    let rule_id = arena
        .append_child(parent, AstNode::new(AstNodeData::Rule, start))
        .ok_or_else(|| Error::new(start.line.max(1) as usize, start.column.max(1) as usize, ErrorKind::MalformedDeclaration, "arena append failed"))?;

    for group_raw in split_top_level_commas(selector_raw.trim()) {
        let trimmed = group_raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let data = SelectorGroupData { raw: trimmed.to_string(), refined: false };
        arena.append_child(rule_id, AstNode::new(AstNodeData::SelectorGroup(data), start));
    }

    let mut body_cursor = SourceCursor::new(&body);
    let mut pending_comments = Vec::new();
    loop {
        skip_whitespace_and_comments(&mut body_cursor, &mut pending_comments)?;
        if body_cursor.eof() {
            break;
        }
        let decl_start = body_cursor.position();
        let (raw, _terminator) = read_until_top_level(&mut body_cursor, &[';']);
        if body_cursor.peek() == Some(';') {
            body_cursor.advance();
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let data = DeclarationData { raw: trimmed.to_string(), refined: false };
        let id = arena
            .append_child(rule_id, AstNode::new(AstNodeData::Declaration(data), decl_start))
            .ok_or_else(|| Error::new(decl_start.line.max(1) as usize, decl_start.column.max(1) as usize, ErrorKind::MalformedDeclaration, "arena append failed"))?;
        attach_comments(arena, id, &mut pending_comments);
    }

    Ok(rule_id)
}

fn split_top_level_commas(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.clone());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNodeData as Data;

    #[test]
    fn parses_simple_rule() {
        let sheet = parse_stylesheet("div { color: red; }").unwrap();
        let root = sheet.root();
        let rule = sheet.arena.children(root)[0];
        assert!(matches!(sheet.arena.get(rule).unwrap().value().data, Data::Rule));
        let group = sheet.arena.children(rule)[0];
        match &sheet.arena.get(group).unwrap().value().data {
            Data::SelectorGroup(d) => assert_eq!(d.raw, "div"),
            _ => panic!("expected selector group"),
        }
    }

    #[test]
    fn splits_multiple_selector_groups_by_comma() {
        let sheet = parse_stylesheet("a, b { color: red; }").unwrap();
        let rule = sheet.arena.children(sheet.root())[0];
        let groups = sheet.arena.children(rule);
        assert_eq!(groups.len(), 3); // 2 selector groups + 1 declaration
    }

    #[test]
    fn comment_attaches_to_following_rule() {
        let sheet = parse_stylesheet("/* note */ div { color: red; }").unwrap();
        let rule = sheet.arena.children(sheet.root())[0];
        let node = sheet.arena.get(rule).unwrap();
        assert_eq!(node.value().comments.len(), 1);
        assert_eq!(node.value().comments[0].text, " note ");
    }

    #[test]
    fn trailing_comment_with_nothing_after_is_orphaned() {
        let sheet = parse_stylesheet("div{color:red;} /* trailing */").unwrap();
        assert_eq!(sheet.orphaned_comments.len(), 1);
    }

    #[test]
    fn unclosed_block_errors() {
        let err = parse_stylesheet("div { color: red;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnclosedBlock);
    }

    #[test]
    fn media_at_rule_nests_rules() {
        let sheet = parse_stylesheet("@media screen { div { color: red; } }").unwrap();
        let at_rule = sheet.arena.children(sheet.root())[0];
        match &sheet.arena.get(at_rule).unwrap().value().data {
            Data::AtRule(d) => assert_eq!(d.name, "media"),
            _ => panic!("expected at-rule"),
        }
        let nested_rule = sheet.arena.children(at_rule)[0];
        assert!(matches!(sheet.arena.get(nested_rule).unwrap().value().data, Data::Rule));
    }

    #[test]
    fn font_face_at_rule_has_flat_declarations() {
        let sheet = parse_stylesheet("@font-face { font-family: \"X\"; src: url(x.woff); }").unwrap();
        let at_rule = sheet.arena.children(sheet.root())[0];
        let decls = sheet.arena.children(at_rule);
        assert_eq!(decls.len(), 2);
        assert!(matches!(sheet.arena.get(decls[0]).unwrap().value().data, Data::Declaration(_)));
    }

    #[test]
    fn import_at_rule_without_block() {
        let sheet = parse_stylesheet("@import \"foo.css\";").unwrap();
        let at_rule = sheet.arena.children(sheet.root())[0];
        match &sheet.arena.get(at_rule).unwrap().value().data {
            Data::AtRule(d) => {
                assert_eq!(d.name, "import");
                assert!(!d.has_block);
            }
            _ => panic!("expected at-rule"),
        }
    }
}
