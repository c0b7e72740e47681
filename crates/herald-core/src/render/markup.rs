//! MarkupRenderer trait definition.
//!
//! The port through which an expanded, interpolated email document becomes
//! the final markup string. Implementations live in herald-infra
//! (e.g., `HtmlMarkupRenderer`).

use herald_types::document::DocumentNode;

/// Failure reported by a markup renderer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkupError {
    #[error("markup renderer '{renderer}' rejected the document: {message}")]
    Rejected { renderer: String, message: String },

    #[error("markup rendering failed: {0}")]
    Failed(String),
}

/// Turns a fully interpolated document tree into a markup string.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Wrap in
/// [`BoxMarkupRenderer`](super::box_markup::BoxMarkupRenderer) for dynamic
/// dispatch.
pub trait MarkupRenderer: Send + Sync {
    /// Short renderer name (e.g., "html").
    fn name(&self) -> &str;

    /// Render the document. The tree holds no placeholders by this point.
    fn render(
        &self,
        document: &DocumentNode,
    ) -> impl std::future::Future<Output = Result<String, MarkupError>> + Send;
}
