//! Email output.
//!
//! A document-shaped body goes through the full pipeline: parse, expand,
//! serialize, interpolate in embedded-JSON mode, re-parse, then markup. The
//! subject is returned as authored. A body that is missing or not a
//! document is passed through for downstream validation.

use herald_types::context::DataContext;
use herald_types::document::{DocumentNode, is_document_shaped};
use herald_types::step::ControlValues;
use serde_json::Value;

use super::RenderError;
use super::box_markup::BoxMarkupRenderer;
use crate::document::{DocumentExpander, parse_document};
use crate::template::TemplateEngine;

pub const SUBJECT_KEY: &str = "subject";
pub const BODY_KEY: &str = "body";

/// Borrowed collaborators for one email render.
pub(super) struct EmailPipeline<'a> {
    pub expander: &'a DocumentExpander,
    pub interpolator: &'a TemplateEngine,
    pub markup: &'a BoxMarkupRenderer,
}

impl EmailPipeline<'_> {
    pub async fn render(
        &self,
        controls: &ControlValues,
        context: &DataContext,
    ) -> Result<ControlValues, RenderError> {
        let mut output = ControlValues::new();
        if let Some(subject) = controls.get(SUBJECT_KEY) {
            output.insert(SUBJECT_KEY.to_string(), subject.clone());
        }

        let body = match controls.get(BODY_KEY) {
            Some(body) if is_document_shaped(body) => body,
            other => {
                tracing::debug!("email body is not a document, passing through");
                if let Some(body) = other {
                    output.insert(BODY_KEY.to_string(), body.clone());
                }
                return Ok(output);
            }
        };

        let markup = self.render_body(body, context).await?;
        output.insert(BODY_KEY.to_string(), Value::String(markup));
        Ok(output)
    }

    async fn render_body(&self, body: &Value, context: &DataContext) -> Result<String, RenderError> {
        let document = parse_document(body)?;
        let expanded = self.expander.expand(&document, context)?;

        let serialized = serde_json::to_string(&expanded)
            .map_err(|e| RenderError::Serialization(e.to_string()))?;
        let interpolated = self.interpolator.render(&serialized, context)?;
        let reparsed: DocumentNode = serde_json::from_str(&interpolated)
            .map_err(|e| RenderError::Reparse(e.to_string()))?;

        tracing::debug!(
            renderer = self.markup.name(),
            nodes = reparsed.node_count(),
            "rendering email markup"
        );
        Ok(self.markup.render(&reparsed).await?)
    }
}
