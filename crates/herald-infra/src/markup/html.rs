//! HtmlMarkupRenderer -- document tree to HTML.
//!
//! Covers the node kinds the block editor emits. Unknown kinds render their
//! children only, so forward-compatible nodes never drop text.

use herald_core::render::{MarkupError, MarkupRenderer};
use herald_types::document::{DocumentNode, Mark, NodeKind};
use serde_json::Value;

/// Renders documents to HTML, optionally wrapped in an `<html><body>` shell.
#[derive(Debug, Clone)]
pub struct HtmlMarkupRenderer {
    wrap_document: bool,
}

impl HtmlMarkupRenderer {
    pub fn new(wrap_document: bool) -> Self {
        Self { wrap_document }
    }

    /// Render synchronously. The async trait method delegates here.
    pub fn render_html(&self, document: &DocumentNode) -> Result<String, MarkupError> {
        let mut out = String::new();
        write_node(document, &mut out)?;
        if self.wrap_document {
            Ok(format!(
                "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{out}</body></html>"
            ))
        } else {
            Ok(out)
        }
    }
}

impl Default for HtmlMarkupRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MarkupRenderer for HtmlMarkupRenderer {
    fn name(&self) -> &str {
        "html"
    }

    async fn render(&self, document: &DocumentNode) -> Result<String, MarkupError> {
        self.render_html(document)
    }
}

// ---------------------------------------------------------------------------
// Node rendering
// ---------------------------------------------------------------------------

fn write_node(node: &DocumentNode, out: &mut String) -> Result<(), MarkupError> {
    match &node.kind {
        NodeKind::Text => write_text(node, out),
        NodeKind::Paragraph => {
            out.push_str(&open_tag("p", &align_style(node)));
            write_children(node, out)?;
            out.push_str("</p>");
        }
        NodeKind::Heading => {
            let level = node
                .attrs
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);
            out.push_str(&open_tag(&format!("h{level}"), &align_style(node)));
            write_children(node, out)?;
            out.push_str(&format!("</h{level}>"));
        }
        NodeKind::BulletList => wrap("ul", node, out)?,
        NodeKind::OrderedList => wrap("ol", node, out)?,
        NodeKind::ListItem => wrap("li", node, out)?,
        NodeKind::Section => wrap("div", node, out)?,
        NodeKind::Image => {
            let src = node.attr_str("src").ok_or_else(|| MarkupError::Rejected {
                renderer: "html".to_string(),
                message: "image node without src".to_string(),
            })?;
            let alt = node.attr_str("alt").unwrap_or_default();
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape(src),
                escape(alt)
            ));
        }
        NodeKind::Button => {
            let href = node.attr_str("url").unwrap_or("#");
            out.push_str(&format!("<a class=\"button\" href=\"{}\">", escape(href)));
            match node.attr_str("text") {
                Some(text) => out.push_str(&escape(text)),
                None => write_children(node, out)?,
            }
            out.push_str("</a>");
        }
        NodeKind::HorizontalRule => out.push_str("<hr>"),
        NodeKind::HardBreak => out.push_str("<br>"),
        NodeKind::Doc | NodeKind::For | NodeKind::Variable | NodeKind::Other(_) => {
            write_children(node, out)?
        }
    }
    Ok(())
}

fn write_children(node: &DocumentNode, out: &mut String) -> Result<(), MarkupError> {
    for child in &node.content {
        write_node(child, out)?;
    }
    Ok(())
}

fn wrap(tag: &str, node: &DocumentNode, out: &mut String) -> Result<(), MarkupError> {
    out.push_str(&open_tag(tag, ""));
    write_children(node, out)?;
    out.push_str(&format!("</{tag}>"));
    Ok(())
}

fn open_tag(tag: &str, style: &str) -> String {
    if style.is_empty() {
        format!("<{tag}>")
    } else {
        format!("<{tag} style=\"{}\">", escape(style))
    }
}

/// `text-align` from the node's attrs; `left` is the default and omitted.
fn align_style(node: &DocumentNode) -> String {
    match node.attr_str("textAlign") {
        Some(align @ ("center" | "right" | "justify")) => format!("text-align:{align}"),
        _ => String::new(),
    }
}

/// Text with its marks applied, outermost mark first.
fn write_text(node: &DocumentNode, out: &mut String) {
    let Some(text) = node.text.as_deref() else {
        return;
    };
    let mut html = escape(text);
    for mark in node.marks.iter().rev() {
        html = apply_mark(mark, html);
    }
    out.push_str(&html);
}

fn apply_mark(mark: &Mark, inner: String) -> String {
    match mark.kind.as_str() {
        "bold" | "strong" => format!("<strong>{inner}</strong>"),
        "italic" | "em" => format!("<em>{inner}</em>"),
        "underline" => format!("<u>{inner}</u>"),
        "strike" => format!("<s>{inner}</s>"),
        "code" => format!("<code>{inner}</code>"),
        "link" => {
            let href = mark.attrs.get("href").and_then(Value::as_str).unwrap_or("#");
            format!("<a href=\"{}\">{inner}</a>", escape(href))
        }
        _ => inner,
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> DocumentNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_paragraph_and_marks() {
        let document = doc(json!({
            "type": "doc",
            "content": [{
                "type": "paragraph",
                "attrs": { "textAlign": "center" },
                "content": [
                    { "type": "text", "text": "Hi " },
                    {
                        "type": "text",
                        "text": "Ada",
                        "marks": [{ "type": "bold" }, { "type": "link", "attrs": { "href": "https://a.test?x=1&y=2" } }]
                    }
                ]
            }]
        }));
        let html = HtmlMarkupRenderer::new(false).render_html(&document).unwrap();
        assert_eq!(
            html,
            "<p style=\"text-align:center\">Hi <strong><a href=\"https://a.test?x=1&amp;y=2\">Ada</a></strong></p>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let document = DocumentNode::new(NodeKind::Doc)
            .with_content(vec![DocumentNode::text("<script>\"x\" & 'y'</script>")]);
        let html = HtmlMarkupRenderer::new(false).render_html(&document).unwrap();
        assert_eq!(html, "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;");
    }

    #[test]
    fn test_lists_headings_and_blocks() {
        let document = doc(json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 2 }, "content": [{ "type": "text", "text": "Items" }] },
                { "type": "bulletList", "content": [
                    { "type": "listItem", "content": [{ "type": "text", "text": "A" }] },
                    { "type": "listItem", "content": [{ "type": "text", "text": "B" }] }
                ]},
                { "type": "horizontalRule" },
                { "type": "button", "attrs": { "text": "Open", "url": "/o" } },
                { "type": "callout", "content": [{ "type": "text", "text": "kept" }] }
            ]
        }));
        let html = HtmlMarkupRenderer::new(false).render_html(&document).unwrap();
        assert_eq!(
            html,
            "<h2>Items</h2><ul><li>A</li><li>B</li></ul><hr><a class=\"button\" href=\"/o\">Open</a>kept"
        );
    }

    #[test]
    fn test_image_without_src_rejected() {
        let document = DocumentNode::new(NodeKind::Doc)
            .with_content(vec![DocumentNode::new(NodeKind::Image)]);
        let err = HtmlMarkupRenderer::default().render_html(&document).unwrap_err();
        assert!(err.to_string().contains("without src"));
    }

    #[tokio::test]
    async fn test_wrapped_document_through_trait() {
        let document = DocumentNode::new(NodeKind::Doc)
            .with_content(vec![DocumentNode::text("x")]);
        let renderer = HtmlMarkupRenderer::default();
        assert_eq!(MarkupRenderer::name(&renderer), "html");
        let html = MarkupRenderer::render(&renderer, &document).await.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("<body>x</body></html>"));
    }
}
