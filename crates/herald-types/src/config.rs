//! Global configuration types for Herald.
//!
//! `HeraldConfig` represents the top-level `config.toml` that controls how
//! skip rules are evaluated, how email markup is produced, and telemetry.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Herald rendering core.
///
/// Loaded from `~/.herald/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Skip-rule evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// When true, a broken skip rule evaluates to "do not skip" instead of
    /// failing the render.
    #[serde(default = "default_true")]
    pub safe_mode: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { safe_mode: true }
    }
}

/// Email markup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Wrap rendered email bodies in an `<html><body>` shell.
    #[serde(default = "default_true")]
    pub wrap_document: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            wrap_document: true,
        }
    }
}

/// Telemetry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Export spans through OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

fn default_true() -> bool {
    true
}
