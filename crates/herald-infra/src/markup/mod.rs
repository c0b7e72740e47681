//! Markup renderers for email bodies.

pub mod html;

pub use html::HtmlMarkupRenderer;
