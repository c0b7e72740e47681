//! Channel output rendering.
//!
//! [`OutputRenderer`] picks the behavior for a step type:
//! - in-app, SMS, push, chat: controls minus `skip` ([`passthrough`])
//! - email: document pipeline plus markup ([`email`])
//! - digest, delay: normalized scheduling descriptor ([`schedule`])

pub mod box_markup;
pub mod email;
pub mod markup;
pub mod passthrough;
pub mod schedule;

use herald_observe::render_attrs::OP_RENDER_STEP;
use herald_types::context::DataContext;
use herald_types::error::ControlError;
use herald_types::step::{ControlValues, StepType};
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::document::{DocumentExpander, ExpandError};
use crate::template::{TemplateEngine, TemplateError};

pub use box_markup::BoxMarkupRenderer;
pub use markup::{MarkupError, MarkupRenderer};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a step could not be rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("failed to serialize expanded document: {0}")]
    Serialization(String),

    /// Interpolated values broke the document's JSON.
    #[error("interpolated document is not valid JSON: {0}")]
    Reparse(String),
}

// ---------------------------------------------------------------------------
// StepOutput
// ---------------------------------------------------------------------------

/// The channel-ready output of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutput {
    pub step_type: StepType,
    pub values: ControlValues,
}

impl StepOutput {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

// ---------------------------------------------------------------------------
// OutputRenderer
// ---------------------------------------------------------------------------

/// Renders any step type's controls against a Data Context.
///
/// Holds no per-call state; one instance can serve concurrent renders.
#[derive(Debug)]
pub struct OutputRenderer {
    expander: DocumentExpander,
    interpolator: TemplateEngine,
    markup: BoxMarkupRenderer,
}

impl OutputRenderer {
    pub fn new(markup: BoxMarkupRenderer) -> Self {
        Self {
            expander: DocumentExpander::new(),
            interpolator: TemplateEngine::embedded_json(),
            markup,
        }
    }

    /// Name of the markup renderer used for email bodies.
    pub fn markup_name(&self) -> &str {
        self.markup.name()
    }

    pub async fn render(
        &self,
        step_type: StepType,
        controls: &ControlValues,
        context: &DataContext,
    ) -> Result<StepOutput, RenderError> {
        let span = tracing::info_span!(
            "render_step",
            operation = OP_RENDER_STEP,
            step_type = %step_type,
            keys = controls.len(),
        );

        async {
            let values = match step_type {
                StepType::Email => {
                    let pipeline = email::EmailPipeline {
                        expander: &self.expander,
                        interpolator: &self.interpolator,
                        markup: &self.markup,
                    };
                    pipeline.render(controls, context).await?
                }
                channel if channel.is_channel() => passthrough::render_passthrough(controls),
                _ => schedule::render_schedule(step_type, controls)?,
            };
            tracing::debug!(keys = values.len(), "step rendered");
            Ok::<_, RenderError>(StepOutput { step_type, values })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_types::document::DocumentNode;
    use serde_json::json;

    /// Emits the document's text content, one line per top-level child.
    struct PlainTextMarkup;

    impl MarkupRenderer for PlainTextMarkup {
        fn name(&self) -> &str {
            "plain"
        }

        async fn render(&self, document: &DocumentNode) -> Result<String, MarkupError> {
            Ok(document
                .content
                .iter()
                .map(DocumentNode::plain_text)
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    fn renderer() -> OutputRenderer {
        OutputRenderer::new(BoxMarkupRenderer::new(PlainTextMarkup))
    }

    fn bag(value: Value) -> ControlValues {
        value.as_object().cloned().unwrap()
    }

    fn paragraph(children: Vec<DocumentNode>) -> Value {
        json!({ "type": "paragraph", "content": children })
    }

    fn variable(id: &str) -> DocumentNode {
        DocumentNode::new(herald_types::document::NodeKind::Variable).with_attr("id", id)
    }

    #[tokio::test]
    async fn test_sms_passthrough() {
        let output = renderer()
            .render(
                StepType::Sms,
                &bag(json!({ "body": "Code 1234", "skip": { "==": [1, 2] } })),
                &DataContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(output.step_type, StepType::Sms);
        assert_eq!(output.into_value(), json!({ "body": "Code 1234" }));
    }

    #[tokio::test]
    async fn test_email_document_pipeline() {
        let body = json!({
            "type": "doc",
            "content": [
                paragraph(vec![DocumentNode::text("Hi "), variable("subscriber.firstName")]),
                {
                    "type": "paragraph",
                    "attrs": { "showIfKey": "payload.vip" },
                    "content": [{ "type": "text", "text": "VIP only" }]
                },
                {
                    "type": "for",
                    "attrs": { "each": "payload.items" },
                    "content": [paragraph(vec![variable("payload.items.name")])]
                }
            ]
        });
        let controls = bag(json!({
            "subject": "Order {{ payload.orderId }}",
            "body": body.to_string(),
        }));
        let ctx = DataContext::new()
            .with_subscriber(json!({ "firstName": "Ada" }))
            .with_payload(json!({
                "vip": false,
                "orderId": 7,
                "items": [{ "name": "Lamp" }, { "name": "Desk \"oak\"" }]
            }));

        let output = renderer().render(StepType::Email, &controls, &ctx).await.unwrap();

        assert_eq!(output.get("subject"), Some(&json!("Order {{ payload.orderId }}")));
        assert_eq!(output.get("body"), Some(&json!("Hi Ada\nLamp\nDesk \"oak\"")));
    }

    #[tokio::test]
    async fn test_email_hyphenated_step_id_and_scalars() {
        let body = json!({
            "type": "doc",
            "content": [
                paragraph(vec![DocumentNode::text("First: "), variable("steps.digest-step.events[0].actor")]),
                {
                    "type": "for",
                    "attrs": { "each": "steps.digest-step.events" },
                    "content": [paragraph(vec![variable("steps.digest-step.events.actor")])]
                },
                paragraph(vec![
                    DocumentNode::text("Premium: "),
                    variable("payload.premium"),
                    DocumentNode::text(", score "),
                    variable("payload.score"),
                ])
            ]
        });
        let controls = bag(json!({ "subject": "Digest", "body": body }));
        let ctx = DataContext::new()
            .with_payload(json!({ "premium": true, "score": 1.0 }))
            .with_step_output(
                "digest-step",
                json!({ "events": [{ "actor": "Ann" }, { "actor": "Bob" }] }),
            );

        let output = renderer().render(StepType::Email, &controls, &ctx).await.unwrap();
        assert_eq!(
            output.get("body"),
            Some(&json!("First: Ann\nAnn\nBob\nPremium: true, score 1"))
        );
    }

    #[tokio::test]
    async fn test_email_object_value_survives_reparse() {
        let controls = bag(json!({
            "subject": "Cart",
            "body": {
                "type": "doc",
                "content": [paragraph(vec![variable("payload.cart")])]
            }
        }));
        let ctx = DataContext::new().with_payload(json!({ "cart": { "items": ["a", "b"] } }));

        let output = renderer().render(StepType::Email, &controls, &ctx).await.unwrap();
        assert_eq!(output.get("body"), Some(&json!("{'items':['a','b']}")));
    }

    #[tokio::test]
    async fn test_email_non_document_body_passes_through() {
        let controls = bag(json!({ "subject": "Hi", "body": "<p>{{ payload.x }}</p>", "skip": true }));
        let output = renderer()
            .render(StepType::Email, &controls, &DataContext::new())
            .await
            .unwrap();
        assert_eq!(
            output.into_value(),
            json!({ "subject": "Hi", "body": "<p>{{ payload.x }}</p>" })
        );

        let output = renderer()
            .render(StepType::Email, &bag(json!({ "subject": "Only" })), &DataContext::new())
            .await
            .unwrap();
        assert_eq!(output.into_value(), json!({ "subject": "Only" }));
    }

    #[tokio::test]
    async fn test_email_non_array_iteration_fails() {
        let controls = bag(json!({
            "subject": "x",
            "body": {
                "type": "doc",
                "content": [{ "type": "for", "attrs": { "each": "payload.items" }, "content": [] }]
            }
        }));
        let ctx = DataContext::new().with_payload(json!({ "items": "nope" }));
        let err = renderer().render(StepType::Email, &controls, &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            RenderError::Expand(ExpandError::IterationSourceNotArray { .. })
        ));
    }

    #[tokio::test]
    async fn test_digest_failure_is_control_error() {
        let err = renderer()
            .render(StepType::Digest, &bag(json!({ "foo": 1 })), &DataContext::new())
            .await
            .unwrap_err();
        let RenderError::Control(control) = err else {
            panic!("expected a control error");
        };
        assert!(control.to_string().contains("\"foo\":1"));
    }

    #[tokio::test]
    async fn test_delay_descriptor() {
        let output = renderer()
            .render(
                StepType::Delay,
                &bag(json!({ "amount": 2, "unit": "hours" })),
                &DataContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            output.into_value(),
            json!({ "amount": 2, "unit": "hours", "type": "regular" })
        );
    }

    #[test]
    fn test_markup_name() {
        assert_eq!(renderer().markup_name(), "plain");
    }
}
