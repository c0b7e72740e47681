use thiserror::Error;

use crate::step::StepType;

/// Errors from validating or parsing a step's control values.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("{step_type} controls must be a JSON object")]
    NotAnObject { step_type: StepType },

    #[error("invalid {step_type} controls: {message}")]
    Invalid { step_type: StepType, message: String },

    /// A tagged-union control bag matched none of its shapes.
    #[error(
        "{step_type} controls match none of the supported shapes ({attempted}): {failures}; control values: {values}"
    )]
    NoMatchingVariant {
        step_type: StepType,
        /// Shapes tried, in order (e.g. "regular, timed").
        attempted: String,
        /// Why each shape was rejected.
        failures: String,
        /// The offending control values, serialized.
        values: String,
    },
}

impl ControlError {
    /// The step type whose controls failed.
    pub fn step_type(&self) -> StepType {
        match self {
            ControlError::NotAnObject { step_type }
            | ControlError::Invalid { step_type, .. }
            | ControlError::NoMatchingVariant { step_type, .. } => *step_type,
        }
    }
}
