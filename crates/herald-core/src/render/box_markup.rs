//! BoxMarkupRenderer -- object-safe dynamic dispatch wrapper for MarkupRenderer.
//!
//! 1. `MarkupRendererDyn` is the object-safe form with boxed futures
//! 2. Blanket-impl `MarkupRendererDyn` for all `T: MarkupRenderer`
//! 3. `BoxMarkupRenderer` wraps `Box<dyn MarkupRendererDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use herald_types::document::DocumentNode;

use super::markup::{MarkupError, MarkupRenderer};

/// Object-safe version of [`MarkupRenderer`] with boxed futures.
pub trait MarkupRendererDyn: Send + Sync {
    fn name(&self) -> &str;

    fn render_boxed<'a>(
        &'a self,
        document: &'a DocumentNode,
    ) -> Pin<Box<dyn Future<Output = Result<String, MarkupError>> + Send + 'a>>;
}

impl<T: MarkupRenderer> MarkupRendererDyn for T {
    fn name(&self) -> &str {
        MarkupRenderer::name(self)
    }

    fn render_boxed<'a>(
        &'a self,
        document: &'a DocumentNode,
    ) -> Pin<Box<dyn Future<Output = Result<String, MarkupError>> + Send + 'a>> {
        Box::pin(self.render(document))
    }
}

/// Type-erased markup renderer, selected at runtime from configuration.
pub struct BoxMarkupRenderer {
    inner: Box<dyn MarkupRendererDyn + Send + Sync>,
}

impl BoxMarkupRenderer {
    /// Wrap a concrete `MarkupRenderer` in a type-erased box.
    pub fn new<T: MarkupRenderer + 'static>(renderer: T) -> Self {
        Self {
            inner: Box::new(renderer),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn render(&self, document: &DocumentNode) -> Result<String, MarkupError> {
        self.inner.render_boxed(document).await
    }
}

impl std::fmt::Debug for BoxMarkupRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxMarkupRenderer")
            .field("name", &self.name())
            .finish()
    }
}
