//! Step types and control value bags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author-supplied configuration for a single workflow step.
pub type ControlValues = Map<String, Value>;

/// Control key holding the step's skip rule.
pub const SKIP_KEY: &str = "skip";

/// The kind of step, which selects the output renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    InApp,
    Email,
    Sms,
    Push,
    Chat,
    Delay,
    Digest,
}

impl StepType {
    /// All step types, in display order.
    pub const ALL: [StepType; 7] = [
        StepType::InApp,
        StepType::Email,
        StepType::Sms,
        StepType::Push,
        StepType::Chat,
        StepType::Delay,
        StepType::Digest,
    ];

    /// Channel steps deliver a message; the others only schedule.
    pub fn is_channel(&self) -> bool {
        !matches!(self, StepType::Delay | StepType::Digest)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepType::InApp => write!(f, "in_app"),
            StepType::Email => write!(f, "email"),
            StepType::Sms => write!(f, "sms"),
            StepType::Push => write!(f, "push"),
            StepType::Chat => write!(f, "chat"),
            StepType::Delay => write!(f, "delay"),
            StepType::Digest => write!(f, "digest"),
        }
    }
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "in_app" | "inapp" => Ok(StepType::InApp),
            "email" => Ok(StepType::Email),
            "sms" => Ok(StepType::Sms),
            "push" => Ok(StepType::Push),
            "chat" => Ok(StepType::Chat),
            "delay" => Ok(StepType::Delay),
            "digest" => Ok(StepType::Digest),
            other => Err(format!("invalid step type: '{other}'")),
        }
    }
}
