//! Rewriting references to an iteration source inside a duplicated subtree.
//!
//! Copy `i` of an iteration over `payload.items` must read
//! `payload.items[i]`. Every string in the copy that mentions the source
//! path as a whole path prefix gets `[i]` inserted right after it: variable
//! ids, placeholders in text, string attributes (including nested `each` and
//! `showIfKey` paths), and mark attributes.

use herald_types::document::DocumentNode;
use serde_json::Value;

/// Insert `[index]` after every whole-prefix occurrence of `source` in `text`.
pub fn index_references(text: &str, source: &str, index: usize) -> String {
    if source.is_empty() || !text.contains(source) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 4);
    let mut cursor = 0;
    for (start, _) in text.match_indices(source) {
        if start < cursor {
            continue;
        }
        let end = start + source.len();
        out.push_str(&text[cursor..end]);
        if starts_path(&text[..start]) && ends_path(&text[end..]) {
            out.push('[');
            out.push_str(&index.to_string());
            out.push(']');
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// The match is not the tail of a longer path (`x.payload.items`, `mypayload`).
fn starts_path(before: &str) -> bool {
    match before.chars().next_back() {
        None => true,
        Some(c) => !(c.is_alphanumeric() || matches!(c, '_' | '.' | ']' | '$' | '-')),
    }
}

/// The match ends a path segment: end of string, a member access, or
/// placeholder punctuation. An existing `[` means it is already indexed.
fn ends_path(after: &str) -> bool {
    match after.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '.' | '|' | '}' | ')' | ',' | '\'' | '"'),
    }
}

/// Rewrite every reference to `source` in `node` and its subtree.
pub fn index_subtree(node: &mut DocumentNode, source: &str, index: usize) {
    if let Some(text) = node.text.as_mut() {
        *text = index_references(text, source, index);
    }
    for value in node.attrs.values_mut() {
        index_value(value, source, index);
    }
    for mark in &mut node.marks {
        for value in mark.attrs.values_mut() {
            index_value(value, source, index);
        }
    }
    for child in &mut node.content {
        index_subtree(child, source, index);
    }
}

fn index_value(value: &mut Value, source: &str, index: usize) {
    match value {
        Value::String(s) => *s = index_references(s, source, index),
        Value::Array(items) => items.iter_mut().for_each(|v| index_value(v, source, index)),
        Value::Object(map) => map.values_mut().for_each(|v| index_value(v, source, index)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_types::document::{Mark, NodeKind};
    use serde_json::json;

    #[test]
    fn test_bare_path_and_member_access() {
        assert_eq!(index_references("payload.items", "payload.items", 0), "payload.items[0]");
        assert_eq!(
            index_references("payload.items.label", "payload.items", 2),
            "payload.items[2].label"
        );
    }

    #[test]
    fn test_placeholders_in_text() {
        assert_eq!(
            index_references("{{ payload.items.name | upcase }} & {{payload.items.qty}}", "payload.items", 1),
            "{{ payload.items[1].name | upcase }} & {{payload.items[1].qty}}"
        );
    }

    #[test]
    fn test_does_not_touch_longer_or_indexed_paths() {
        assert_eq!(
            index_references("payload.itemsCount payload.items[3].x other.payload.items", "payload.items", 0),
            "payload.itemsCount payload.items[3].x other.payload.items"
        );
    }

    #[test]
    fn test_subtree_rewrites_attrs_marks_and_nested_sources() {
        let mut node = DocumentNode::new(NodeKind::Paragraph).with_content(vec![
            DocumentNode::new(NodeKind::Variable).with_attr("id", "payload.items.label"),
            DocumentNode::new(NodeKind::For).with_attr("each", "payload.items.tags"),
            DocumentNode::new(NodeKind::Paragraph).with_attr("showIfKey", "payload.items.visible"),
            link_text(),
        ]);
        index_subtree(&mut node, "payload.items", 4);
        assert_eq!(node.content[0].attrs["id"], json!("payload.items[4].label"));
        assert_eq!(node.content[1].attrs["each"], json!("payload.items[4].tags"));
        assert_eq!(node.content[2].attrs["showIfKey"], json!("payload.items[4].visible"));
        assert_eq!(
            node.content[3].marks[0].attrs["href"],
            json!("https://x.test/{{ payload.items[4].slug }}")
        );
    }

    fn link_text() -> DocumentNode {
        let mut text = DocumentNode::text("open");
        let mut attrs = serde_json::Map::new();
        attrs.insert("href".into(), json!("https://x.test/{{ payload.items.slug }}"));
        text.marks.push(Mark {
            kind: "link".into(),
            attrs,
        });
        text
    }
}
