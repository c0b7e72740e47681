//! Digest and delay output: the normalized scheduling descriptor.

use herald_types::error::ControlError;
use herald_types::step::{ControlValues, StepType};
use serde_json::Value;

use crate::controls::schedule::schedule_values;
use crate::controls::{parse_delay, parse_digest};

/// Parse the tagged union for `step_type` and emit its canonical values.
///
/// Only called for `Digest` and `Delay`; other step types are rejected as
/// invalid controls.
pub fn render_schedule(
    step_type: StepType,
    controls: &ControlValues,
) -> Result<ControlValues, ControlError> {
    let values = Value::Object(controls.clone());
    match step_type {
        StepType::Digest => {
            let parsed = parse_digest(&values)?;
            Ok(schedule_values(&parsed, parsed.variant()))
        }
        StepType::Delay => {
            let parsed = parse_delay(&values)?;
            Ok(schedule_values(&parsed, parsed.variant()))
        }
        other => Err(ControlError::Invalid {
            step_type: other,
            message: "not a scheduling step".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> ControlValues {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_timed_digest_descriptor() {
        let output = render_schedule(
            StepType::Digest,
            &bag(json!({ "cron": "0 9 * * 1", "skip": { "!": [true] } })),
        )
        .unwrap();
        assert_eq!(output["type"], json!("timed"));
        assert_eq!(output["cron"], json!("0 9 * * 1"));
        assert!(!output.contains_key("skip"));
    }

    #[test]
    fn test_regular_delay_descriptor() {
        let output =
            render_schedule(StepType::Delay, &bag(json!({ "amount": "15", "unit": "minutes" })))
                .unwrap();
        assert_eq!(output["type"], json!("regular"));
        assert_eq!(output["amount"], json!(15));
        assert_eq!(output["unit"], json!("minutes"));
    }

    #[test]
    fn test_failure_carries_values() {
        let err = render_schedule(StepType::Digest, &bag(json!({ "window": "weekly" }))).unwrap_err();
        assert!(err.to_string().contains("weekly"));
    }

    #[test]
    fn test_channel_step_rejected() {
        let err = render_schedule(StepType::Sms, &ControlValues::new()).unwrap_err();
        assert_eq!(err.step_type(), StepType::Sms);
    }
}
