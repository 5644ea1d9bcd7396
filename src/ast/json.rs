//! JSON introspection dump of a Stylesheet — a structured alternative to
//! the text writer, for tooling that wants the tree itself rather than
//! rendered CSS (editor integrations, debugging, golden-file tests).

use ego_tree::NodeId;
use serde_json::{json, Value};

use crate::ast::{AstArena, Stylesheet};

/// Serializes a whole stylesheet to a `serde_json::Value` tree. Each node
/// becomes an object with its kind, status, position, refined/raw payload,
/// and children; comments attached to a unit ride along as a `comments`
/// array.
pub fn to_json(sheet: &Stylesheet) -> Value {
    json!({
        "root": node_to_json(&sheet.arena, sheet.root()),
        "orphanedComments": sheet.orphaned_comments.iter().map(|c| c.text.clone()).collect::<Vec<_>>(),
    })
}

fn node_to_json(arena: &AstArena, id: NodeId) -> Value {
    let Some(node) = arena.get(id) else { return Value::Null };
    let unit = node.value();
    let children: Vec<Value> = arena.children(id).into_iter().map(|c| node_to_json(arena, c)).collect();
    json!({
        "kind": unit.data.kind_name(),
        "status": format!("{:?}", unit.status),
        "position": { "line": unit.position.line, "column": unit.position.column },
        "comments": unit.comments.iter().map(|c| c.text.clone()).collect::<Vec<_>>(),
        "data": serde_json::to_value(&unit.data).unwrap_or(Value::Null),
        "children": children,
    })
}

/// Renders a whole stylesheet as a pretty-printed JSON string.
pub fn to_json_string(sheet: &Stylesheet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_json(sheet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::parse_stylesheet;

    #[test]
    fn dump_includes_declaration_kind_and_raw_text() {
        let sheet = parse_stylesheet("div { color: red; }").unwrap();
        let value = to_json(&sheet);
        let dumped = value.to_string();
        assert!(dumped.contains("\"Declaration\""));
        assert!(dumped.contains("color: red"));
    }

    #[test]
    fn orphaned_comment_surfaces_at_top_level() {
        let sheet = parse_stylesheet("div { color: red; } /* trailing */").unwrap();
        let value = to_json(&sheet);
        assert_eq!(value["orphanedComments"][0], "trailing");
    }

    #[test]
    fn serializes_to_valid_pretty_printed_string() {
        let sheet = parse_stylesheet("a, b { margin: 0; }").unwrap();
        let text = to_json_string(&sheet).unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed["root"]["kind"], "Stylesheet");
    }
}
