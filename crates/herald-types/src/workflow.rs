//! Workflow domain types for Herald.
//!
//! A stored workflow is an ordered list of steps, each carrying its step type
//! and the author's control values. The rendering core never persists these;
//! they are loaded from YAML/JSON or handed over by the orchestration layer.

use serde::{Deserialize, Serialize};

use crate::step::{ControlValues, SKIP_KEY, StepType};

// ---------------------------------------------------------------------------
// Workflow Definition
// ---------------------------------------------------------------------------

/// A stored workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// User-defined workflow identifier (e.g. "order-shipped").
    pub workflow_id: String,
    /// Human-readable workflow name.
    pub name: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered list of step definitions.
    pub steps: Vec<StepDefinition>,
}

// ---------------------------------------------------------------------------
// Step Definition
// ---------------------------------------------------------------------------

/// A single step in a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    /// User-defined step ID (e.g. "welcome-email"). Unique within a workflow.
    pub step_id: String,
    /// Human-readable step name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The kind of step.
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Author-supplied control values.
    #[serde(default)]
    pub controls: ControlValues,
}

impl StepDefinition {
    /// The step's skip rule, if one is configured.
    pub fn skip_rule(&self) -> Option<&serde_json::Value> {
        self.controls.get(SKIP_KEY).filter(|rule| match rule {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            _ => true,
        })
    }
}
