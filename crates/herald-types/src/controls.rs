//! Typed control-value shapes, one per step type.
//!
//! These structs are the validation schema for author input: deserializing a
//! control bag into them checks required fields and supplies defaults, and the
//! `schemars` derive exports the same shape as JSON Schema for editors.
//!
//! Digest and delay controls are tagged unions of two mutually exclusive
//! shapes. Their enums are untagged here; the core parses them by trying each
//! variant in order so failures can be reported per shape.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::document::EMPTY_DOCUMENT;

// ---------------------------------------------------------------------------
// Channel controls
// ---------------------------------------------------------------------------

/// Email step controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailControls {
    #[serde(default)]
    pub subject: String,
    /// Serialized document JSON, or raw HTML when `editor_type` is `html`.
    #[serde(default = "default_email_body")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_type: Option<EditorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_output_sanitization: Option<bool>,
}

fn default_email_body() -> String {
    EMPTY_DOCUMENT.to_string()
}

/// Which editor produced an email body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EditorType {
    Block,
    Html,
}

/// In-app (inbox) step controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InAppControls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<std::collections::BTreeMap<String, Value>>")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_output_sanitization: Option<bool>,
}

/// A button on an in-app notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
}

/// Where a click navigates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Redirect {
    pub url: String,
    #[serde(default)]
    pub target: RedirectTarget,
}

/// Browsing context for a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum RedirectTarget {
    #[default]
    #[serde(rename = "_self")]
    SelfFrame,
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_parent")]
    Parent,
    #[serde(rename = "_top")]
    Top,
    #[serde(rename = "_unfencedTop")]
    UnfencedTop,
}

impl RedirectTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectTarget::SelfFrame => "_self",
            RedirectTarget::Blank => "_blank",
            RedirectTarget::Parent => "_parent",
            RedirectTarget::Top => "_top",
            RedirectTarget::UnfencedTop => "_unfencedTop",
        }
    }
}

impl FromStr for RedirectTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "_self" => Ok(RedirectTarget::SelfFrame),
            "_blank" => Ok(RedirectTarget::Blank),
            "_parent" => Ok(RedirectTarget::Parent),
            "_top" => Ok(RedirectTarget::Top),
            "_unfencedTop" => Ok(RedirectTarget::UnfencedTop),
            other => Err(format!("invalid redirect target: '{other}'")),
        }
    }
}

/// SMS step controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmsControls {
    #[serde(default)]
    pub body: String,
}

/// Push step controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PushControls {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Chat step controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChatControls {
    #[serde(default)]
    pub body: String,
}

// ---------------------------------------------------------------------------
// Scheduling controls
// ---------------------------------------------------------------------------

/// Unit of a relative scheduling amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Seconds => write!(f, "seconds"),
            TimeUnit::Minutes => write!(f, "minutes"),
            TimeUnit::Hours => write!(f, "hours"),
            TimeUnit::Days => write!(f, "days"),
            TimeUnit::Weeks => write!(f, "weeks"),
            TimeUnit::Months => write!(f, "months"),
        }
    }
}

/// How far back a regular digest looks for a prior event before it starts
/// collecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LookBackWindow {
    #[serde(deserialize_with = "positive_amount")]
    #[schemars(with = "u32", range(min = 1))]
    pub amount: u32,
    pub unit: TimeUnit,
}

/// Digest collecting events for a fixed relative window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegularDigestControls {
    #[serde(deserialize_with = "positive_amount")]
    #[schemars(with = "u32", range(min = 1))]
    pub amount: u32,
    pub unit: TimeUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look_back_window: Option<LookBackWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_key: Option<String>,
}

/// Digest releasing on a cron schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimedDigestControls {
    pub cron: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_key: Option<String>,
}

/// Digest step controls: exactly one of the two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DigestControls {
    Regular(RegularDigestControls),
    Timed(TimedDigestControls),
}

/// Delay for a fixed relative amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegularDelayControls {
    #[serde(deserialize_with = "positive_amount")]
    #[schemars(with = "u32", range(min = 1))]
    pub amount: u32,
    pub unit: TimeUnit,
}

/// Delay until the next cron occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimedDelayControls {
    pub cron: String,
}

/// Delay step controls: exactly one of the two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DelayControls {
    Regular(RegularDelayControls),
    Timed(TimedDelayControls),
}

/// Name of the relative-window variant of a scheduling union.
pub const REGULAR_VARIANT: &str = "regular";

/// Name of the cron variant of a scheduling union.
pub const TIMED_VARIANT: &str = "timed";

impl DigestControls {
    pub fn variant(&self) -> &'static str {
        match self {
            DigestControls::Regular(_) => REGULAR_VARIANT,
            DigestControls::Timed(_) => TIMED_VARIANT,
        }
    }
}

impl DelayControls {
    pub fn variant(&self) -> &'static str {
        match self {
            DelayControls::Regular(_) => REGULAR_VARIANT,
            DelayControls::Timed(_) => TIMED_VARIANT,
        }
    }
}

/// Accept a positive integer given as a number or a numeric string.
///
/// Control values are often interpolated upstream, so `"5"` is as common as `5`.
fn positive_amount<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let amount = match &raw {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match amount {
        Some(amount) if amount >= 1 && amount <= u64::from(u32::MAX) => Ok(amount as u32),
        _ => Err(serde::de::Error::custom(format!(
            "amount must be a positive integer, got {raw}"
        ))),
    }
}
