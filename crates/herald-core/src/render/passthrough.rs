//! In-app, SMS, push and chat output.
//!
//! These channels receive values already interpolated upstream, so the only
//! adaptation is dropping the skip rule.

use herald_types::step::{ControlValues, SKIP_KEY};

/// Copy of `controls` without the `skip` key.
pub fn render_passthrough(controls: &ControlValues) -> ControlValues {
    let mut output = controls.clone();
    output.remove(SKIP_KEY);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skip_removed_rest_verbatim() {
        let controls = json!({
            "body": "Hi {{ payload.name }}",
            "skip": { "==": [1, 1] },
            "data": { "nested": [1, 2] }
        });
        let controls = controls.as_object().unwrap();
        let output = render_passthrough(controls);

        assert!(!output.contains_key("skip"));
        assert_eq!(output["body"], json!("Hi {{ payload.name }}"));
        assert_eq!(output["data"], json!({ "nested": [1, 2] }));
        assert!(controls.contains_key("skip"));
    }

    #[test]
    fn test_empty_controls() {
        assert!(render_passthrough(&ControlValues::new()).is_empty());
    }
}
