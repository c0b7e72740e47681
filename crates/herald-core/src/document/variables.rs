//! Variable node normalization.
//!
//! After special nodes are expanded, every `variable` node becomes a text
//! node holding a placeholder the interpolation pass understands. Marks on
//! the variable (bold, link, ...) stay on the produced text node.

use herald_types::document::{
    DocumentNode, NodeKind, VARIABLE_FALLBACK_KEY, VARIABLE_ID_KEY,
};
use serde_json::Map;

/// Replace every variable node in `node`'s subtree with a placeholder text node.
/// Variable nodes without an id are dropped.
pub fn normalize_variables(mut node: DocumentNode) -> DocumentNode {
    node.content = std::mem::take(&mut node.content)
        .into_iter()
        .filter_map(|child| match child.kind {
            NodeKind::Variable => variable_to_text(child),
            _ => Some(normalize_variables(child)),
        })
        .collect();
    node
}

fn variable_to_text(node: DocumentNode) -> Option<DocumentNode> {
    let id = node.attr_str(VARIABLE_ID_KEY)?.trim();
    if id.is_empty() {
        return None;
    }
    let placeholder = match node.attr_str(VARIABLE_FALLBACK_KEY).filter(|f| !f.is_empty()) {
        Some(fallback) => format!("{{{{ {id} | default: {} }}}}", quote_literal(fallback)),
        None => format!("{{{{ {id} }}}}"),
    };
    Some(DocumentNode {
        kind: NodeKind::Text,
        text: Some(placeholder),
        attrs: Map::new(),
        marks: node.marks,
        content: Vec::new(),
        extra: node.extra,
    })
}

/// Quote a fallback literal, preferring single quotes.
fn quote_literal(value: &str) -> String {
    if value.contains('\'') {
        format!("\"{}\"", value.replace('"', "'"))
    } else {
        format!("'{value}'")
    }
}
