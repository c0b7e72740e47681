//! Tagged-union parsing for digest and delay controls.
//!
//! Both unions have a `regular` shape (amount + unit) and a `timed` shape
//! (cron expression). Shapes are tried in that fixed order; the first that
//! validates wins. When none does, the error names every shape tried, why
//! each was rejected, and the offending values.

use herald_types::controls::{
    DelayControls, DigestControls, REGULAR_VARIANT, TIMED_VARIANT, TimedDelayControls,
    TimedDigestControls,
};
use herald_types::error::ControlError;
use herald_types::step::{ControlValues, SKIP_KEY, StepType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Key added to a normalized schedule naming the matched shape.
pub const VARIANT_KEY: &str = "type";

/// Parse digest controls, regular shape first.
pub fn parse_digest(values: &Value) -> Result<DigestControls, ControlError> {
    let values = without_skip(StepType::Digest, values)?;
    let mut failures = Vec::new();

    match try_shape(&values) {
        Ok(regular) => return Ok(DigestControls::Regular(regular)),
        Err(reason) => failures.push(format!("{REGULAR_VARIANT}: {reason}")),
    }
    match try_shape::<TimedDigestControls>(&values)
        .and_then(|timed| validate_cron(&timed.cron).map(|()| timed))
    {
        Ok(timed) => return Ok(DigestControls::Timed(timed)),
        Err(reason) => failures.push(format!("{TIMED_VARIANT}: {reason}")),
    }

    Err(no_match(StepType::Digest, failures, &values))
}

/// Parse delay controls, regular shape first.
pub fn parse_delay(values: &Value) -> Result<DelayControls, ControlError> {
    let values = without_skip(StepType::Delay, values)?;
    let mut failures = Vec::new();

    match try_shape(&values) {
        Ok(regular) => return Ok(DelayControls::Regular(regular)),
        Err(reason) => failures.push(format!("{REGULAR_VARIANT}: {reason}")),
    }
    match try_shape::<TimedDelayControls>(&values)
        .and_then(|timed| validate_cron(&timed.cron).map(|()| timed))
    {
        Ok(timed) => return Ok(DelayControls::Timed(timed)),
        Err(reason) => failures.push(format!("{TIMED_VARIANT}: {reason}")),
    }

    Err(no_match(StepType::Delay, failures, &values))
}

/// The canonical map for a parsed schedule: its fields plus `type`.
pub fn schedule_values<T: Serialize>(parsed: &T, variant: &str) -> ControlValues {
    let mut map = match serde_json::to_value(parsed) {
        Ok(Value::Object(map)) => map,
        _ => ControlValues::new(),
    };
    map.insert(VARIANT_KEY.to_string(), Value::String(variant.to_string()));
    map
}

/// Check a 5- or 6-field cron expression.
pub fn validate_cron(expr: &str) -> Result<(), String> {
    let trimmed = expr.trim();
    let normalized = match trimmed.split_whitespace().count() {
        5 => format!("0 {trimmed}"),
        6 => trimmed.to_string(),
        n => return Err(format!("cron expression must have 5 or 6 fields, got {n}")),
    };
    normalized
        .parse::<croner::Cron>()
        .map(|_| ())
        .map_err(|e| format!("invalid cron expression '{trimmed}': {e}"))
}

fn without_skip(step_type: StepType, values: &Value) -> Result<Value, ControlError> {
    match values {
        Value::Object(map) => {
            let mut map = map.clone();
            map.remove(SKIP_KEY);
            Ok(Value::Object(map))
        }
        _ => Err(ControlError::NotAnObject { step_type }),
    }
}

fn try_shape<T: DeserializeOwned>(values: &Value) -> Result<T, String> {
    serde_json::from_value(values.clone()).map_err(|e| e.to_string())
}

fn no_match(step_type: StepType, failures: Vec<String>, values: &Value) -> ControlError {
    ControlError::NoMatchingVariant {
        step_type,
        attempted: format!("{REGULAR_VARIANT}, {TIMED_VARIANT}"),
        failures: failures.join("; "),
        values: values.to_string(),
    }
}
