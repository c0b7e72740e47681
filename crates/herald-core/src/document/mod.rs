//! Document tree expansion.
//!
//! Two passes over a clone of the author's rich-text tree:
//! 1. special nodes ([`expander`]): conditional guards are evaluated and
//!    iterations are unrolled with indexed references;
//! 2. variable nodes ([`variables`]) become `{{ path }}` text placeholders.
//!
//! The second pass runs only after the first completes, so placeholders
//! produced by it always carry their final indices.

mod arena;
pub mod expander;
pub mod references;
pub mod variables;

use herald_observe::render_attrs::OP_EXPAND_DOCUMENT;
use herald_types::context::DataContext;
use herald_types::document::DocumentNode;
use serde_json::Value;

use crate::template::{TemplateEngine, TemplateError};

pub use expander::ExpansionStats;
pub use variables::normalize_variables;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Authoring errors found while expanding a document.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error("iteration source '{path}' must be an array, found {found}")]
    IterationSourceNotArray { path: String, found: String },

    #[error("'{kind}' node has both a conditional guard and an iteration source")]
    ConflictingControls { kind: String },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

// ---------------------------------------------------------------------------
// DocumentExpander
// ---------------------------------------------------------------------------

/// Runs both expansion passes. Guards are rendered with a plain-mode engine.
#[derive(Debug, Default)]
pub struct DocumentExpander {
    guards: TemplateEngine,
}

impl DocumentExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand special nodes, then normalize variables.
    pub fn expand(
        &self,
        document: &DocumentNode,
        context: &DataContext,
    ) -> Result<DocumentNode, ExpandError> {
        let expanded = self.expand_special_nodes(document, context)?;
        Ok(normalize_variables(expanded))
    }

    /// Conditional pruning and iteration unrolling only.
    pub fn expand_special_nodes(
        &self,
        document: &DocumentNode,
        context: &DataContext,
    ) -> Result<DocumentNode, ExpandError> {
        let _span = tracing::debug_span!(
            "expand_document",
            operation = OP_EXPAND_DOCUMENT,
            nodes = document.node_count(),
        )
        .entered();

        let (expanded, stats) = expander::expand_special_nodes(document, context, &self.guards)?;
        tracing::debug!(
            pruned = stats.pruned,
            iterations = stats.iterations,
            copies = stats.copies,
            nodes = expanded.node_count(),
            "document expanded"
        );
        Ok(expanded)
    }
}

/// Parse a document from a JSON object or a string holding one.
pub fn parse_document(value: &Value) -> Result<DocumentNode, ExpandError> {
    match value {
        Value::String(raw) => {
            serde_json::from_str(raw).map_err(|e| ExpandError::Malformed(e.to_string()))
        }
        Value::Object(_) => {
            serde_json::from_value(value.clone()).map_err(|e| ExpandError::Malformed(e.to_string()))
        }
        other => Err(ExpandError::Malformed(format!(
            "expected a document object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_types::document::NodeKind;
    use serde_json::json;

    fn item_list_doc() -> Value {
        json!({
            "type": "doc",
            "content": [{
                "type": "for",
                "attrs": { "each": "payload.items" },
                "content": [{
                    "type": "paragraph",
                    "content": [{ "type": "variable", "attrs": { "id": "payload.items.label" } }]
                }]
            }]
        })
    }

    #[test]
    fn test_expand_runs_both_passes() {
        let ctx = DataContext::new()
            .with_payload(json!({ "items": [{ "label": "A" }, { "label": "B" }] }));
        let doc = parse_document(&item_list_doc()).unwrap();
        let out = DocumentExpander::new().expand(&doc, &ctx).unwrap();

        assert_eq!(out.content.len(), 2);
        assert_eq!(out.content[0].content[0].kind, NodeKind::Text);
        assert_eq!(
            out.content[0].content[0].text.as_deref(),
            Some("{{ payload.items[0].label }}")
        );
        assert_eq!(
            out.content[1].content[0].text.as_deref(),
            Some("{{ payload.items[1].label }}")
        );
    }

    #[test]
    fn test_parse_document_from_string() {
        let raw = Value::String(item_list_doc().to_string());
        let doc = parse_document(&raw).unwrap();
        assert_eq!(doc.kind, NodeKind::Doc);
    }

    #[test]
    fn test_parse_document_rejects_non_objects() {
        assert!(matches!(parse_document(&json!(42)), Err(ExpandError::Malformed(_))));
        assert!(matches!(
            parse_document(&json!("{not json")),
            Err(ExpandError::Malformed(_))
        ));
    }
}
