//! Workflow definition parsing and validation.
//!
//! Definitions arrive as YAML (authored by hand) or JSON (exported by the
//! editor). Both parse into the same `WorkflowDefinition` and are validated
//! before use.

use std::collections::HashSet;

use herald_types::step::StepType;
use herald_types::workflow::WorkflowDefinition;
use thiserror::Error;

use crate::render::RenderError;
use crate::rules::RuleError;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from loading or rendering a workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// YAML/JSON parse failure.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Structural validation failure.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A skip rule failed while evaluating in unsafe mode.
    #[error("step '{step_id}': {source}")]
    SkipRule {
        step_id: String,
        #[source]
        source: RuleError,
    },

    /// A step's output could not be rendered.
    #[error("step '{step_id}' ({step_type}): {source}")]
    Render {
        step_id: String,
        step_type: StepType,
        #[source]
        source: RenderError,
    },
}

impl WorkflowError {
    /// The offending step, when the error belongs to one.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            WorkflowError::SkipRule { step_id, .. } | WorkflowError::Render { step_id, .. } => {
                Some(step_id)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a YAML string into a validated `WorkflowDefinition`.
pub fn parse_workflow_yaml(yaml: &str) -> Result<WorkflowDefinition, WorkflowError> {
    let def: WorkflowDefinition =
        serde_yaml_ng::from_str(yaml).map_err(|e| WorkflowError::ParseError(e.to_string()))?;
    validate_definition(&def)?;
    Ok(def)
}

/// Parse a JSON string into a validated `WorkflowDefinition`.
pub fn parse_workflow_json(json: &str) -> Result<WorkflowDefinition, WorkflowError> {
    let def: WorkflowDefinition =
        serde_json::from_str(json).map_err(|e| WorkflowError::ParseError(e.to_string()))?;
    validate_definition(&def)?;
    Ok(def)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate structural constraints on a `WorkflowDefinition`.
///
/// Checks:
/// - Name is non-empty
/// - At least one step exists
/// - Every step ID is non-empty and unique
pub fn validate_definition(def: &WorkflowDefinition) -> Result<(), WorkflowError> {
    if def.name.trim().is_empty() {
        return Err(WorkflowError::ValidationError(
            "workflow name must not be empty".to_string(),
        ));
    }

    if def.steps.is_empty() {
        return Err(WorkflowError::ValidationError(
            "workflow must have at least one step".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for step in &def.steps {
        if step.step_id.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "step ID must not be empty".to_string(),
            ));
        }
        if !seen_ids.insert(step.step_id.as_str()) {
            return Err(WorkflowError::ValidationError(format!(
                "duplicate step ID: '{}'",
                step.step_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELCOME_YAML: &str = r#"
workflowId: welcome
name: Welcome
steps:
  - stepId: greet
    type: in_app
    controls:
      body: "Hi {{ subscriber.firstName }}"
  - stepId: wait
    type: delay
    controls:
      amount: 1
      unit: days
  - stepId: follow-up
    type: email
    controls:
      subject: Still there?
      skip:
        "==": [{ var: payload.converted }, true]
"#;

    #[test]
    fn test_parse_yaml() {
        let def = parse_workflow_yaml(WELCOME_YAML).unwrap();
        assert_eq!(def.workflow_id, "welcome");
        assert_eq!(def.steps.len(), 3);
        assert_eq!(def.steps[1].step_type, StepType::Delay);
        assert!(def.steps[2].skip_rule().is_some());
    }

    #[test]
    fn test_parse_json() {
        let def = parse_workflow_json(
            r#"{"workflowId":"w","name":"W","steps":[{"stepId":"s","type":"sms","controls":{"body":"x"}}]}"#,
        )
        .unwrap();
        assert_eq!(def.steps[0].step_type, StepType::Sms);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_workflow_yaml("name: [unclosed").unwrap_err();
        assert!(matches!(err, WorkflowError::ParseError(_)));

        let err = parse_workflow_json(r#"{"workflowId":"w","name":"W","steps":[{"stepId":"s","type":"fax"}]}"#)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ParseError(_)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = parse_workflow_json(r#"{"workflowId":"w","name":" ","steps":[{"stepId":"s","type":"sms"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn test_no_steps_rejected() {
        let err = parse_workflow_json(r#"{"workflowId":"w","name":"W","steps":[]}"#).unwrap_err();
        assert!(err.to_string().contains("at least one step"));
    }

    #[test]
    fn test_duplicate_step_ids_rejected() {
        let err = parse_workflow_yaml(
            r#"
workflowId: w
name: W
steps:
  - { stepId: a, type: sms }
  - { stepId: a, type: push }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::ValidationError(_)));
        assert!(err.to_string().contains("duplicate step ID: 'a'"));
        assert!(err.step_id().is_none());
    }
}
