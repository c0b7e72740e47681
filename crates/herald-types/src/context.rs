//! The read-only Data Context templates and rules evaluate against.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Runtime data for one render: trigger payload, subscriber, prior step outputs.
///
/// Supplied by the orchestration layer. Never mutated during rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataContext {
    /// Trigger payload.
    #[serde(default)]
    pub payload: Map<String, Value>,
    /// The subscriber being notified.
    #[serde(default)]
    pub subscriber: Map<String, Value>,
    /// Outputs of previously executed steps, keyed by step ID.
    #[serde(default)]
    pub steps: Map<String, Value>,
}

impl DataContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style payload setter. Non-object values are ignored.
    pub fn with_payload(mut self, payload: Value) -> Self {
        if let Value::Object(map) = payload {
            self.payload = map;
        }
        self
    }

    /// Builder-style subscriber setter. Non-object values are ignored.
    pub fn with_subscriber(mut self, subscriber: Value) -> Self {
        if let Value::Object(map) = subscriber {
            self.subscriber = map;
        }
        self
    }

    /// Record a prior step's output.
    pub fn with_step_output(mut self, step_id: &str, output: Value) -> Self {
        self.steps.insert(step_id.to_string(), output);
        self
    }

    /// The JSON object templates and rules see.
    ///
    /// Shape:
    /// ```json
    /// { "payload": { ... }, "subscriber": { ... }, "steps": { "<step_id>": ... } }
    /// ```
    pub fn to_value(&self) -> Value {
        json!({
            "payload": self.payload,
            "subscriber": self.subscriber,
            "steps": self.steps,
        })
    }
}
