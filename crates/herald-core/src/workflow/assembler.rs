//! Maps a stored workflow onto renderer invocations.
//!
//! Each step's skip rule is evaluated first; steps that are not skipped are
//! rendered in order. Every rendered output is recorded under
//! `steps.<step_id>` in a working copy of the Data Context, so later steps
//! can reference earlier ones.

use herald_observe::render_attrs::{OP_EVALUATE_SKIP, OP_RENDER_WORKFLOW};
use herald_types::context::DataContext;
use herald_types::step::{ControlValues, StepType};
use herald_types::workflow::WorkflowDefinition;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use super::definition::WorkflowError;
use crate::controls::normalize;
use crate::render::{OutputRenderer, StepOutput};
use crate::rules::{EvaluationMode, RuleEvaluator};

// ---------------------------------------------------------------------------
// Plan and result types
// ---------------------------------------------------------------------------

/// One step, ready to render: sanitized controls plus its skip rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPlan {
    pub step_id: String,
    pub step_type: StepType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_rule: Option<Value>,
    pub controls: ControlValues,
}

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRendering {
    pub step_id: String,
    pub step_type: StepType,
    pub skipped: bool,
    /// Why the skip rule could not be evaluated (safe mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_error: Option<String>,
    /// Absent when the step was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<StepOutput>,
}

// ---------------------------------------------------------------------------
// WorkflowAssembler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct WorkflowAssembler {
    renderer: OutputRenderer,
    evaluator: RuleEvaluator,
    mode: EvaluationMode,
}

impl WorkflowAssembler {
    /// Skip rules are evaluated in safe mode unless changed with [`Self::with_mode`].
    pub fn new(renderer: OutputRenderer) -> Self {
        Self {
            renderer,
            evaluator: RuleEvaluator::new(),
            mode: EvaluationMode::Safe,
        }
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_evaluator(mut self, evaluator: RuleEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Build a plan for every step, sanitizing controls.
    ///
    /// The skip rule is taken from the raw controls so scalar rules survive
    /// sanitization.
    pub fn assemble(&self, def: &WorkflowDefinition) -> Vec<StepPlan> {
        def.steps
            .iter()
            .map(|step| {
                let raw = Value::Object(step.controls.clone());
                let controls = normalize(step.step_type, &raw).unwrap_or_else(|| step.controls.clone());
                StepPlan {
                    step_id: step.step_id.clone(),
                    step_type: step.step_type,
                    skip_rule: step.skip_rule().cloned(),
                    controls,
                }
            })
            .collect()
    }

    /// Render every planned step in order.
    ///
    /// Stops at the first step that fails; the error names that step.
    pub async fn render_all(
        &self,
        workflow_id: &str,
        plan: &[StepPlan],
        context: &DataContext,
    ) -> Result<Vec<StepRendering>, WorkflowError> {
        let span = tracing::info_span!(
            "render_workflow",
            operation = OP_RENDER_WORKFLOW,
            workflow_id = %workflow_id,
            steps = plan.len(),
        );

        async {
            let mut working = context.clone();
            let mut renderings = Vec::with_capacity(plan.len());

            for step in plan {
                let rendering = self.render_step(step, &working).await?;
                if let Some(output) = &rendering.output {
                    working
                        .steps
                        .insert(step.step_id.clone(), Value::Object(output.values.clone()));
                }
                renderings.push(rendering);
            }

            let skipped = renderings.iter().filter(|r| r.skipped).count();
            tracing::info!(rendered = renderings.len() - skipped, skipped, "workflow rendered");
            Ok::<_, WorkflowError>(renderings)
        }
        .instrument(span)
        .await
    }

    /// Evaluate one step's skip rule and, unless skipped, render it.
    pub async fn render_step(
        &self,
        step: &StepPlan,
        context: &DataContext,
    ) -> Result<StepRendering, WorkflowError> {
        let (skipped, skip_error) = self.evaluate_skip(step, context)?;
        if skipped {
            tracing::debug!(step_id = %step.step_id, "step skipped");
            return Ok(StepRendering {
                step_id: step.step_id.clone(),
                step_type: step.step_type,
                skipped,
                skip_error,
                output: None,
            });
        }

        let output = self
            .renderer
            .render(step.step_type, &step.controls, context)
            .await
            .map_err(|source| WorkflowError::Render {
                step_id: step.step_id.clone(),
                step_type: step.step_type,
                source,
            })?;

        Ok(StepRendering {
            step_id: step.step_id.clone(),
            step_type: step.step_type,
            skipped,
            skip_error,
            output: Some(output),
        })
    }

    fn evaluate_skip(
        &self,
        step: &StepPlan,
        context: &DataContext,
    ) -> Result<(bool, Option<String>), WorkflowError> {
        let Some(rule) = &step.skip_rule else {
            return Ok((false, None));
        };
        let _span = tracing::debug_span!(
            "evaluate_skip",
            operation = OP_EVALUATE_SKIP,
            step_id = %step.step_id,
            step_type = %step.step_type,
        )
        .entered();

        let outcome = self
            .evaluator
            .evaluate_in_context(rule, context, self.mode)
            .map_err(|source| WorkflowError::SkipRule {
                step_id: step.step_id.clone(),
                source,
            })?;
        if let Some(error) = &outcome.error {
            tracing::warn!(step_id = %step.step_id, %error, "skip rule failed, step will run");
        }
        Ok((outcome.result, outcome.error))
    }
}
