//! Workflow support: definition parsing/validation and the assembler that
//! turns a definition plus a Data Context into per-step outputs.

pub mod assembler;
pub mod definition;

pub use assembler::{StepPlan, StepRendering, WorkflowAssembler};
pub use definition::{WorkflowError, parse_workflow_json, parse_workflow_yaml, validate_definition};
