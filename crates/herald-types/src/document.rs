//! Rich-text Document Node tree.
//!
//! Email bodies are authored in a block editor that stores its content as a
//! JSON tree (`{"type": "doc", "content": [...]}`). The schema is deliberately
//! open: any `type` string is accepted and unknown fields pass through, so
//! nodes produced by newer editor versions survive a render untouched.
//!
//! The kinds the rendering core acts on are modelled as a closed enum with an
//! `Other` catch-all, which keeps matching exhaustive without closing the
//! wire format.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Reserved attributes
// ---------------------------------------------------------------------------

/// Attribute holding a conditional guard expression.
pub const SHOW_IF_KEY: &str = "showIfKey";

/// Attribute holding the array path an iteration node repeats over.
pub const EACH_KEY: &str = "each";

/// Attribute holding a variable reference's path.
pub const VARIABLE_ID_KEY: &str = "id";

/// Attribute holding a variable reference's fallback literal.
pub const VARIABLE_FALLBACK_KEY: &str = "fallback";

/// Serialized form of an empty email body.
pub const EMPTY_DOCUMENT: &str =
    r#"{"type":"doc","content":[{"type":"paragraph","attrs":{"textAlign":"left"}}]}"#;

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// The `type` tag of a document node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    Text,
    Variable,
    For,
    Section,
    BulletList,
    OrderedList,
    ListItem,
    Image,
    Button,
    HorizontalRule,
    HardBreak,
    /// Any node type this core passes through untouched.
    Other(String),
}

impl NodeKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Text => "text",
            NodeKind::Variable => "variable",
            NodeKind::For => "for",
            NodeKind::Section => "section",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::Image => "image",
            NodeKind::Button => "button",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::Other(name) => name,
        }
    }

    /// Whether this kind is a list wrapper (one marker per item).
    pub fn is_list(&self) -> bool {
        matches!(self, NodeKind::BulletList | NodeKind::OrderedList)
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "doc" => NodeKind::Doc,
            "paragraph" => NodeKind::Paragraph,
            "heading" => NodeKind::Heading,
            "text" => NodeKind::Text,
            "variable" => NodeKind::Variable,
            "for" => NodeKind::For,
            "section" => NodeKind::Section,
            "bulletList" => NodeKind::BulletList,
            "orderedList" => NodeKind::OrderedList,
            "listItem" => NodeKind::ListItem,
            "image" => NodeKind::Image,
            "button" => NodeKind::Button,
            "horizontalRule" => NodeKind::HorizontalRule,
            "hardBreak" => NodeKind::HardBreak,
            _ => NodeKind::Other(value),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Mark
// ---------------------------------------------------------------------------

/// Inline formatting or link annotation on a text node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// DocumentNode
// ---------------------------------------------------------------------------

/// One element of the rich-text authoring tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DocumentNode>,
    /// Fields this core does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What a node means to the expander.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole<'a> {
    /// Carries a conditional guard.
    Conditional(&'a str),
    /// Repeats its content once per element of the array at this path.
    Iteration(&'a str),
    /// Both a guard and an iteration source -- an authoring error.
    Conflicting,
    /// Nothing special.
    Plain,
}

impl DocumentNode {
    /// Create an empty node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: None,
            attrs: Map::new(),
            marks: Vec::new(),
            content: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Create a plain text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text)
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Builder-style children setter.
    pub fn with_content(mut self, content: Vec<DocumentNode>) -> Self {
        self.content = content;
        self
    }

    /// A string-valued attribute, if present.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Classify this node for the expansion pass.
    ///
    /// Empty guards are treated as absent. Only `for` nodes iterate.
    pub fn role(&self) -> NodeRole<'_> {
        let guard = self.attr_str(SHOW_IF_KEY).filter(|g| !g.trim().is_empty());
        let each = if self.kind == NodeKind::For {
            self.attr_str(EACH_KEY).filter(|e| !e.trim().is_empty())
        } else {
            None
        };
        match (guard, each) {
            (Some(_), Some(_)) => NodeRole::Conflicting,
            (Some(guard), None) => NodeRole::Conditional(guard),
            (None, Some(each)) => NodeRole::Iteration(each),
            (None, None) => NodeRole::Plain,
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.content.iter().map(DocumentNode::node_count).sum::<usize>()
    }

    /// Concatenated text of every text leaf in this subtree.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &DocumentNode, out: &mut String) {
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for child in &node.content {
        collect_text(child, out);
    }
}

/// Whether a value looks like a serialized or structured document root.
///
/// Accepts either an object or a JSON string holding an object whose `type`
/// is `doc`.
pub fn is_document_shaped(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.get("type").and_then(Value::as_str) == Some("doc"),
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .map(|parsed| parsed.is_object() && is_document_shaped(&parsed))
            .unwrap_or(false),
        _ => false,
    }
}
