//! Boolean rule evaluator for step `skip` conditions.
//!
//! Rules are JSON logic trees: a scalar, an array, or a single-key object
//! `{ "<operator>": operands }`. Evaluation runs on `datalogic_rs`; the
//! notification-specific extensions in [`operators`] are registered on it as
//! custom operators through the same builder callers use for their own.
//!
//! Before a rule reaches the engine it is prepared: nesting is bounded,
//! operator names are checked, aliases are resolved, and `var` paths are
//! canonicalized through [`crate::path`] so bracketed indices and quoted
//! keys (`steps['digest-step'].events[0]`) look up the same values the
//! interpolator sees.
//!
//! Nothing escapes [`RuleEvaluator::evaluate`] except its typed result: in
//! [`EvaluationMode::Safe`] a broken rule becomes `false` plus a message, in
//! [`EvaluationMode::Unsafe`] it becomes [`RuleError::EvaluationFailed`].

pub mod operators;

use std::fmt;
use std::sync::Arc;

use datalogic_rs::arena::DataArena;
use datalogic_rs::{CustomOperator, DataLogic, DataValue, LogicError};
use herald_types::context::DataContext;
use serde_json::{Map, Value};

use crate::path::{self, Segment};

/// Maximum nesting of rule nodes before evaluation is refused.
pub const MAX_RULE_DEPTH: usize = 64;

/// JSON-logic operators the engine provides.
const STANDARD_OPERATORS: &[&str] = &[
    "var", "missing", "missing_some", "if", "?:", "==", "===", "!=", "!==", "!", "!!", "and",
    "or", "<", "<=", ">", ">=", "in", "cat", "substr", "+", "-", "*", "/", "%", "min", "max",
    "map", "filter", "reduce", "all", "some", "none", "merge",
];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during rule evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// Terminal error surfaced in unsafe mode. Wraps any of the others.
    #[error("Failed to evaluate rule: {0}")]
    EvaluationFailed(String),

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("malformed rule: {0}")]
    Malformed(String),

    #[error("rule nesting exceeds {max} levels")]
    TooDeep { max: usize },

    #[error("rule engine error: {0}")]
    Engine(String),
}

// ---------------------------------------------------------------------------
// Outcome and mode
// ---------------------------------------------------------------------------

/// How evaluation failures are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// Failures become `false` with an error message.
    #[default]
    Safe,
    /// Failures are returned as `Err(RuleError::EvaluationFailed)`.
    Unsafe,
}

impl EvaluationMode {
    pub fn from_safe_flag(safe: bool) -> Self {
        if safe { Self::Safe } else { Self::Unsafe }
    }
}

/// Result of evaluating a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub result: bool,
    /// Set only in safe mode, when evaluation failed.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// RuleEvaluator
// ---------------------------------------------------------------------------

/// A registered operator, shared between the engines built per evaluation.
pub type SharedOperator = Arc<dyn CustomOperator + Send + Sync>;

/// JSON-logic evaluator with the notification operator set registered.
///
/// The evaluator holds only its operator table. A fresh `DataLogic` engine
/// is built for every evaluation, so the evaluator is `Send + Sync` and can
/// live inside long-running renderers.
#[derive(Clone, Default)]
pub struct RuleEvaluator {
    operators: Vec<(String, SharedOperator)>,
    aliases: Vec<(String, String)>,
}

impl fmt::Debug for RuleEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.operators.iter().map(|(name, _)| name.as_str()).collect();
        names.extend(self.aliases.iter().map(|(alias, _)| alias.as_str()));
        names.sort_unstable();
        f.debug_struct("RuleEvaluator")
            .field("operators", &names)
            .finish()
    }
}

impl RuleEvaluator {
    /// Create an evaluator with the standard and extension operators.
    pub fn new() -> Self {
        operators::register_extensions(Self::generic())
    }

    /// Create an evaluator with only the standard JSON-logic operators.
    pub fn generic() -> Self {
        Self::default()
    }

    /// Register a custom operator. Its operands are evaluated before the call.
    /// Registering a name twice keeps the later operator.
    pub fn with_operator<O>(mut self, name: &str, op: O) -> Self
    where
        O: CustomOperator + Send + Sync + 'static,
    {
        let op: SharedOperator = Arc::new(op);
        self.operators.retain(|(existing, _)| existing != name);
        self.operators.push((name.to_string(), op));
        self
    }

    /// Make `alias` another spelling of the operator `target`.
    pub fn with_alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases.retain(|(existing, _)| existing != alias);
        self.aliases.push((alias.to_string(), target.to_string()));
        self
    }

    /// Whether `name` is a standard, registered, or aliased operator.
    pub fn knows_operator(&self, name: &str) -> bool {
        let name = self.canonical_name(name);
        STANDARD_OPERATORS.contains(&name) || self.operators.iter().any(|(op, _)| op == name)
    }

    /// Evaluate `rule` against `data` and coerce the result to a boolean.
    pub fn evaluate(
        &self,
        rule: &Value,
        data: &Value,
        mode: EvaluationMode,
    ) -> Result<RuleOutcome, RuleError> {
        let verdict = self
            .apply(&serde_json::json!({ "!!": [rule] }), data)
            .map(|value| value.as_bool().unwrap_or(false));

        match verdict {
            Ok(result) => Ok(RuleOutcome {
                result,
                error: None,
            }),
            Err(err) => {
                let message = match err {
                    RuleError::EvaluationFailed(inner) => inner,
                    other => other.to_string(),
                };
                match mode {
                    EvaluationMode::Safe => {
                        tracing::warn!(error = %message, "rule evaluation failed, treating as false");
                        Ok(RuleOutcome {
                            result: false,
                            error: Some(message),
                        })
                    }
                    EvaluationMode::Unsafe => Err(RuleError::EvaluationFailed(message)),
                }
            }
        }
    }

    /// Evaluate `rule` against a render's Data Context.
    pub fn evaluate_in_context(
        &self,
        rule: &Value,
        context: &DataContext,
        mode: EvaluationMode,
    ) -> Result<RuleOutcome, RuleError> {
        self.evaluate(rule, &context.to_value(), mode)
    }

    /// Evaluate `rule` and return the raw JSON value.
    pub fn apply(&self, rule: &Value, data: &Value) -> Result<Value, RuleError> {
        let prepared = self.prepare(rule, 0)?;
        self.engine()
            .evaluate_json(&prepared, data, None)
            .map_err(|e| RuleError::Engine(e.to_string()))
    }

    /// Structural check: every operator is known and operand shapes are sane.
    /// Needs no data and never fails loudly.
    pub fn is_valid_rule(&self, rule: &Value) -> bool {
        self.prepare(rule, 0).is_ok()
    }

    fn engine(&self) -> DataLogic {
        let mut logic = DataLogic::new();
        for (name, op) in &self.operators {
            logic.register_custom_operator(name, Box::new(Registered(Arc::clone(op))));
        }
        logic
    }

    fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, target)| target.as_str())
            .unwrap_or(name)
    }

    /// Check and normalize a rule tree for the engine.
    fn prepare(&self, rule: &Value, depth: usize) -> Result<Value, RuleError> {
        if depth > MAX_RULE_DEPTH {
            return Err(RuleError::TooDeep {
                max: MAX_RULE_DEPTH,
            });
        }
        match rule {
            Value::Array(items) => items
                .iter()
                .map(|item| self.prepare(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let (name, operands) = single_entry(map).ok_or_else(|| {
                    RuleError::Malformed(format!(
                        "operator objects need exactly one key, found {}",
                        map.len()
                    ))
                })?;
                if !self.knows_operator(name) {
                    return Err(RuleError::UnknownOperator(name.to_string()));
                }
                let name = self.canonical_name(name);
                let operands = match name {
                    "var" => self.prepare_var(operands, depth)?,
                    "missing" => self.prepare_paths(operands, depth)?,
                    _ => self.prepare(operands, depth + 1)?,
                };
                let mut node = Map::with_capacity(1);
                node.insert(name.to_string(), operands);
                Ok(Value::Object(node))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    /// `var` takes a path, `[path]`, or `[path, default]`.
    fn prepare_var(&self, operands: &Value, depth: usize) -> Result<Value, RuleError> {
        match operands {
            Value::String(path) => canonical_path(path).map(Value::String),
            Value::Bool(_) => Err(RuleError::Malformed(format!(
                "var path must be a string or number, got {operands}"
            ))),
            Value::Array(items) => {
                let mut prepared = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    prepared.push(match (index, item) {
                        (0, Value::Bool(_)) => {
                            return Err(RuleError::Malformed(format!(
                                "var path must be a string or number, got {item}"
                            )));
                        }
                        (0, Value::String(path)) => Value::String(canonical_path(path)?),
                        _ => self.prepare(item, depth + 1)?,
                    });
                }
                Ok(Value::Array(prepared))
            }
            other => self.prepare(other, depth + 1),
        }
    }

    /// `missing` takes path strings, possibly produced by a nested rule.
    fn prepare_paths(&self, operands: &Value, depth: usize) -> Result<Value, RuleError> {
        match operands {
            Value::String(path) => canonical_path(path).map(Value::String),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(path) => canonical_path(path).map(Value::String),
                    other => self.prepare(other, depth + 1),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => self.prepare(other, depth + 1),
        }
    }
}

/// Forwards to a shared operator so each engine owns its own box.
struct Registered(SharedOperator);

impl fmt::Debug for Registered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Registered")
    }
}

impl CustomOperator for Registered {
    fn evaluate<'a>(
        &self,
        args: &'a [DataValue<'a>],
        arena: &'a DataArena,
    ) -> Result<&'a DataValue<'a>, LogicError> {
        self.0.evaluate(args, arena)
    }
}

fn single_entry(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    map.iter().next().map(|(k, v)| (k.as_str(), v))
}

/// Rewrite a resolver path (`items[0]`, `steps['a-b'].x`) in the engine's
/// dotted form (`items.0`, `steps.a-b.x`). The empty path means the whole
/// data object and is kept as is.
fn canonical_path(path: &str) -> Result<String, RuleError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let segments = path::parse_path(trimmed)
        .ok_or_else(|| RuleError::Malformed(format!("malformed variable path '{path}'")))?;
    Ok(segments
        .iter()
        .map(|segment| match segment {
            Segment::Key(key) => (*key).to_string(),
            Segment::Index(index) => index.to_string(),
        })
        .collect::<Vec<_>>()
        .join("."))
}
