//! Control-value schema, validation, and sanitization per step type.

pub mod sanitize;
pub mod schedule;

use herald_types::controls::{
    ChatControls, DelayControls, DigestControls, EmailControls, InAppControls, PushControls,
    SmsControls,
};
use herald_types::error::ControlError;
use herald_types::step::{SKIP_KEY, StepType};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use sanitize::normalize;
pub use schedule::{parse_delay, parse_digest};

/// A control bag validated against its step type's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedControls {
    Email(EmailControls),
    InApp(InAppControls),
    Sms(SmsControls),
    Push(PushControls),
    Chat(ChatControls),
    Delay(DelayControls),
    Digest(DigestControls),
}

impl TypedControls {
    pub fn step_type(&self) -> StepType {
        match self {
            TypedControls::Email(_) => StepType::Email,
            TypedControls::InApp(_) => StepType::InApp,
            TypedControls::Sms(_) => StepType::Sms,
            TypedControls::Push(_) => StepType::Push,
            TypedControls::Chat(_) => StepType::Chat,
            TypedControls::Delay(_) => StepType::Delay,
            TypedControls::Digest(_) => StepType::Digest,
        }
    }
}

/// Validate a control bag against the shape for `step_type`.
///
/// The bag is sanitized first, so defaults apply and stray keys are ignored.
/// What remains must deserialize into the typed controls.
pub fn validate_controls(step_type: StepType, values: &Value) -> Result<TypedControls, ControlError> {
    let mut sanitized = normalize(step_type, values).ok_or(ControlError::NotAnObject { step_type })?;
    sanitized.remove(SKIP_KEY);
    let sanitized = Value::Object(sanitized);

    Ok(match step_type {
        StepType::Email => TypedControls::Email(typed(step_type, sanitized)?),
        StepType::InApp => TypedControls::InApp(typed(step_type, sanitized)?),
        StepType::Sms => TypedControls::Sms(typed(step_type, sanitized)?),
        StepType::Push => TypedControls::Push(typed(step_type, sanitized)?),
        StepType::Chat => TypedControls::Chat(typed(step_type, sanitized)?),
        StepType::Delay => TypedControls::Delay(parse_delay(&sanitized)?),
        StepType::Digest => TypedControls::Digest(parse_digest(&sanitized)?),
    })
}

fn typed<T: DeserializeOwned>(step_type: StepType, values: Value) -> Result<T, ControlError> {
    serde_json::from_value(values).map_err(|e| ControlError::Invalid {
        step_type,
        message: e.to_string(),
    })
}

/// JSON Schema describing the controls for `step_type`.
pub fn control_schema(step_type: StepType) -> Value {
    let schema = match step_type {
        StepType::Email => schemars::schema_for!(EmailControls),
        StepType::InApp => schemars::schema_for!(InAppControls),
        StepType::Sms => schemars::schema_for!(SmsControls),
        StepType::Push => schemars::schema_for!(PushControls),
        StepType::Chat => schemars::schema_for!(ChatControls),
        StepType::Delay => schemars::schema_for!(DelayControls),
        StepType::Digest => schemars::schema_for!(DigestControls),
    };
    schema.to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_types::controls::TimeUnit;
    use serde_json::json;

    #[test]
    fn test_validate_email_with_defaults() {
        let typed = validate_controls(StepType::Email, &json!({ "subject": "Hi" })).unwrap();
        match typed {
            TypedControls::Email(email) => {
                assert_eq!(email.subject, "Hi");
                assert!(email.body.contains("\"doc\""));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validate_in_app_keeps_actions() {
        let typed = validate_controls(
            StepType::InApp,
            &json!({
                "body": "New comment",
                "primaryAction": { "label": "View", "redirect": { "url": "/c/1" } }
            }),
        )
        .unwrap();
        let TypedControls::InApp(in_app) = typed else {
            panic!("expected in-app controls");
        };
        let action = in_app.primary_action.unwrap();
        assert_eq!(action.label, "View");
        assert_eq!(action.redirect.unwrap().url, "/c/1");
    }

    #[test]
    fn test_validate_digest_selects_variant() {
        let typed = validate_controls(StepType::Digest, &json!({ "amount": 10, "unit": "seconds" })).unwrap();
        assert_eq!(typed.step_type(), StepType::Digest);
        match typed {
            TypedControls::Digest(DigestControls::Regular(regular)) => {
                assert_eq!(regular.unit, TimeUnit::Seconds);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let err = validate_controls(StepType::Sms, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, ControlError::NotAnObject { step_type: StepType::Sms }));
    }

    #[test]
    fn test_validate_delay_neither_shape() {
        let err = validate_controls(StepType::Delay, &json!({ "unit": "days" })).unwrap_err();
        assert!(matches!(err, ControlError::NoMatchingVariant { .. }));
    }

    #[test]
    fn test_control_schema_lists_properties() {
        let schema = control_schema(StepType::Email);
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("subject"));
        assert!(properties.contains_key("body"));
        assert!(properties.contains_key("editorType"));

        let digest = control_schema(StepType::Digest);
        assert!(digest.get("anyOf").is_some());
    }
}
