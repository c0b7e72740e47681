//! Control-value sanitization.
//!
//! Author input arrives as a loose JSON bag. Sanitizing keeps only the keys
//! a step type understands, drops nulls, coerces text fields to strings,
//! fills required defaults, and collapses half-filled actions and redirects.
//! The output is a fixed point: sanitizing it again changes nothing.

use herald_types::controls::{DelayControls, DigestControls, RedirectTarget};
use herald_types::document::EMPTY_DOCUMENT;
use herald_types::step::{ControlValues, SKIP_KEY, StepType};
use serde_json::{Map, Value};

use super::schedule::{self, VARIANT_KEY};

const EMAIL_KEYS: &[&str] = &["subject", "body", "editorType", "layoutId", "disableOutputSanitization"];
const IN_APP_KEYS: &[&str] = &[
    "subject",
    "body",
    "avatar",
    "primaryAction",
    "secondaryAction",
    "redirect",
    "data",
    "disableOutputSanitization",
];
const SMS_KEYS: &[&str] = &["body"];
const PUSH_KEYS: &[&str] = &["subject", "body"];
const CHAT_KEYS: &[&str] = &["body"];
const DIGEST_KEYS: &[&str] = &["amount", "unit", "lookBackWindow", "digestKey", "cron", VARIANT_KEY];
const DELAY_KEYS: &[&str] = &["amount", "unit", "cron", VARIANT_KEY];

/// Keys a step type's controls understand, besides `skip`.
pub fn known_keys(step_type: StepType) -> &'static [&'static str] {
    match step_type {
        StepType::Email => EMAIL_KEYS,
        StepType::InApp => IN_APP_KEYS,
        StepType::Sms => SMS_KEYS,
        StepType::Push => PUSH_KEYS,
        StepType::Chat => CHAT_KEYS,
        StepType::Digest => DIGEST_KEYS,
        StepType::Delay => DELAY_KEYS,
    }
}

/// Sanitize a raw control bag. `None` when `raw` is not an object.
pub fn normalize(step_type: StepType, raw: &Value) -> Option<ControlValues> {
    let raw = raw.as_object()?;
    let mut out = Map::new();

    if let Some(skip) = raw.get(SKIP_KEY).filter(|s| s.is_object()) {
        out.insert(SKIP_KEY.to_string(), skip.clone());
    }
    for key in known_keys(step_type) {
        if let Some(value) = raw.get(*key).filter(|v| !v.is_null()) {
            out.insert((*key).to_string(), value.clone());
        }
    }

    match step_type {
        StepType::Email => sanitize_email(&mut out),
        StepType::InApp => sanitize_in_app(&mut out),
        StepType::Sms | StepType::Chat => require_text(&mut out, "body", ""),
        StepType::Push => {
            require_text(&mut out, "subject", "");
            require_text(&mut out, "body", "");
        }
        StepType::Digest => canonical_digest(&mut out),
        StepType::Delay => canonical_delay(&mut out),
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Channel steps
// ---------------------------------------------------------------------------

fn sanitize_email(out: &mut ControlValues) {
    require_text(out, "subject", "");
    // A structured body is kept as its serialized form.
    if let Some(body @ Value::Object(_)) = out.get("body") {
        let serialized = body.to_string();
        out.insert("body".to_string(), Value::String(serialized));
    }
    require_text(out, "body", EMPTY_DOCUMENT);
    keep_if(out, "editorType", |v| matches!(v.as_str(), Some("block" | "html")));
    keep_if(out, "layoutId", Value::is_string);
    keep_if(out, "disableOutputSanitization", Value::is_boolean);
}

fn sanitize_in_app(out: &mut ControlValues) {
    require_text(out, "body", "");
    optional_text(out, "subject");
    optional_text(out, "avatar");
    keep_if(out, "data", Value::is_object);
    keep_if(out, "disableOutputSanitization", Value::is_boolean);

    for key in ["primaryAction", "secondaryAction"] {
        match out.get(key).and_then(sanitize_action) {
            Some(action) => {
                out.insert(key.to_string(), action);
            }
            None => {
                out.remove(key);
            }
        }
    }
    match out.get("redirect").and_then(sanitize_redirect) {
        Some(redirect) => {
            out.insert("redirect".to_string(), redirect);
        }
        None => {
            out.remove("redirect");
        }
    }
}

/// An action survives only with a non-empty label.
fn sanitize_action(action: &Value) -> Option<Value> {
    let action = action.as_object()?;
    let label = action.get("label").and_then(text_of).filter(|l| !l.is_empty())?;
    let mut out = Map::new();
    out.insert("label".to_string(), Value::String(label));
    if let Some(redirect) = action.get("redirect").and_then(sanitize_redirect) {
        out.insert("redirect".to_string(), redirect);
    }
    Some(Value::Object(out))
}

/// A redirect survives only with a non-empty URL; its target falls back to `_self`.
fn sanitize_redirect(redirect: &Value) -> Option<Value> {
    let redirect = redirect.as_object()?;
    let url = redirect.get("url").and_then(text_of).filter(|u| !u.is_empty())?;
    let target = redirect
        .get("target")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<RedirectTarget>().ok())
        .unwrap_or_default();
    let mut out = Map::new();
    out.insert("url".to_string(), Value::String(url));
    out.insert("target".to_string(), Value::String(target.as_str().to_string()));
    Some(Value::Object(out))
}

// ---------------------------------------------------------------------------
// Scheduling steps
// ---------------------------------------------------------------------------

fn canonical_digest(out: &mut ControlValues) {
    if let Ok(parsed) = schedule::parse_digest(&Value::Object(out.clone())) {
        let canonical = match &parsed {
            DigestControls::Regular(regular) => schedule::schedule_values(regular, parsed.variant()),
            DigestControls::Timed(timed) => schedule::schedule_values(timed, parsed.variant()),
        };
        replace_keeping_skip(out, canonical);
    }
}

fn canonical_delay(out: &mut ControlValues) {
    if let Ok(parsed) = schedule::parse_delay(&Value::Object(out.clone())) {
        let canonical = match &parsed {
            DelayControls::Regular(regular) => schedule::schedule_values(regular, parsed.variant()),
            DelayControls::Timed(timed) => schedule::schedule_values(timed, parsed.variant()),
        };
        replace_keeping_skip(out, canonical);
    }
}

fn replace_keeping_skip(out: &mut ControlValues, canonical: ControlValues) {
    let skip = out.remove(SKIP_KEY);
    *out = canonical;
    if let Some(skip) = skip {
        out.insert(SKIP_KEY.to_string(), skip);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Scalar text: strings as-is, numbers and booleans stringified.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn require_text(out: &mut ControlValues, key: &str, default: &str) {
    let text = out
        .get(key)
        .and_then(text_of)
        .unwrap_or_else(|| default.to_string());
    out.insert(key.to_string(), Value::String(text));
}

fn optional_text(out: &mut ControlValues, key: &str) {
    match out.get(key).and_then(text_of) {
        Some(text) => {
            out.insert(key.to_string(), Value::String(text));
        }
        None => {
            out.remove(key);
        }
    }
}

fn keep_if(out: &mut ControlValues, key: &str, keep: impl Fn(&Value) -> bool) {
    if out.get(key).is_some_and(|v| !keep(v)) {
        out.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(step_type: StepType, raw: Value) -> Value {
        Value::Object(normalize(step_type, &raw).unwrap())
    }

    fn assert_idempotent(step_type: StepType, raw: Value) {
        let once = norm(step_type, raw);
        let twice = norm(step_type, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_object_is_none() {
        assert!(normalize(StepType::Sms, &json!("hello")).is_none());
        assert!(normalize(StepType::Email, &Value::Null).is_none());
    }

    #[test]
    fn test_drops_nulls_and_unknown_keys() {
        let out = norm(StepType::Push, json!({ "subject": null, "body": "b", "extra": 1 }));
        assert_eq!(out, json!({ "subject": "", "body": "b" }));
    }

    #[test]
    fn test_email_defaults_to_empty_document() {
        let out = norm(StepType::Email, json!({}));
        assert_eq!(out["subject"], json!(""));
        assert_eq!(out["body"], json!(EMPTY_DOCUMENT));
    }

    #[test]
    fn test_email_object_body_is_serialized() {
        let out = norm(StepType::Email, json!({ "subject": "s", "body": { "type": "doc" } }));
        assert_eq!(out["body"], json!(r#"{"type":"doc"}"#));
    }

    #[test]
    fn test_email_invalid_editor_type_dropped() {
        let out = norm(StepType::Email, json!({ "editorType": "wysiwyg", "layoutId": 7 }));
        assert!(out.get("editorType").is_none());
        assert!(out.get("layoutId").is_none());
    }

    #[test]
    fn test_action_without_label_collapses() {
        let out = norm(
            StepType::InApp,
            json!({
                "body": "hi",
                "primaryAction": { "label": "", "redirect": { "url": "https://a.test" } },
                "secondaryAction": { "label": "Later" }
            }),
        );
        assert!(out.get("primaryAction").is_none());
        assert_eq!(out["secondaryAction"], json!({ "label": "Later" }));
    }

    #[test]
    fn test_redirect_without_url_collapses_and_target_defaults() {
        let out = norm(
            StepType::InApp,
            json!({
                "body": "hi",
                "redirect": { "target": "_blank" },
                "primaryAction": { "label": "Go", "redirect": { "url": "https://a.test", "target": "_nowhere" } }
            }),
        );
        assert!(out.get("redirect").is_none());
        assert_eq!(
            out["primaryAction"]["redirect"],
            json!({ "url": "https://a.test", "target": "_self" })
        );
    }

    #[test]
    fn test_skip_is_preserved() {
        let skip = json!({ "==": [{ "var": "payload.muted" }, true] });
        let out = norm(StepType::Chat, json!({ "body": "x", "skip": skip }));
        assert_eq!(out["skip"], skip);
        let out = norm(StepType::Digest, json!({ "amount": 1, "unit": "days", "skip": skip }));
        assert_eq!(out["skip"], skip);
        assert_eq!(out["type"], json!("regular"));
    }

    #[test]
    fn test_digest_canonical_shape() {
        let out = norm(StepType::Digest, json!({ "amount": "5", "unit": "minutes", "junk": true }));
        assert_eq!(out, json!({ "amount": 5, "unit": "minutes", "type": "regular" }));
        let out = norm(StepType::Digest, json!({ "cron": "0 9 * * 1" }));
        assert_eq!(out, json!({ "cron": "0 9 * * 1", "type": "timed" }));
    }

    #[test]
    fn test_unparseable_digest_keeps_known_keys() {
        let out = norm(StepType::Digest, json!({ "amount": 0, "foo": "bar" }));
        assert_eq!(out, json!({ "amount": 0 }));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        assert_idempotent(StepType::Email, json!({ "subject": 5, "body": { "type": "doc" }, "x": 1 }));
        assert_idempotent(
            StepType::InApp,
            json!({
                "subject": true,
                "body": null,
                "avatar": ["not text"],
                "primaryAction": { "label": "Go", "redirect": { "url": "u" } },
                "secondaryAction": { "label": null },
                "redirect": { "url": "https://a.test", "target": "_top" },
                "data": { "k": 1 },
                "skip": { "!": [true] }
            }),
        );
        assert_idempotent(StepType::Sms, json!({}));
        assert_idempotent(StepType::Push, json!({ "subject": "s", "body": 1.5 }));
        assert_idempotent(
            StepType::Digest,
            json!({ "amount": 2, "unit": "hours", "lookBackWindow": { "amount": "1", "unit": "days" } }),
        );
        assert_idempotent(StepType::Delay, json!({ "cron": "*/5 * * * *", "amount": null }));
        assert_idempotent(StepType::Delay, json!({ "unit": "weeks" }));
    }
}
