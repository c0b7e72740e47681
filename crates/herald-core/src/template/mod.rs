//! Text interpolation over `{{ path | filter: args }}` placeholders.
//!
//! Wraps a `minijinja::Environment` configured for author templates:
//! - missing paths render empty instead of raising (chainable undefined),
//! - Liquid-style filter calls are translated before parsing ([`syntax`]),
//! - the filter set in [`filters`] replaces the builtin one for shared names,
//! - non-scalar values are written as single-quote JSON so the output can sit
//!   inside a larger JSON document.
//!
//! [`OutputMode::EmbeddedJson`] is for templates that are themselves a
//! serialized JSON document: every written value is JSON-string-escaped so
//! the result re-parses.

pub mod filters;
pub mod syntax;

use herald_observe::render_attrs::OP_INTERPOLATE;
use herald_types::context::DataContext;
use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind, Output, State, UndefinedBehavior};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while interpolating a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template syntax error: {0}")]
    Syntax(String),

    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("template rendering failed: {0}")]
    Render(String),
}

impl From<Error> for TemplateError {
    fn from(err: Error) -> Self {
        let detail = match err.detail() {
            Some(detail) => format!("{} ({})", err.kind(), detail),
            None => err.kind().to_string(),
        };
        match err.kind() {
            ErrorKind::SyntaxError => TemplateError::Syntax(detail),
            ErrorKind::UnknownFilter => TemplateError::UnknownFilter(detail),
            _ => TemplateError::Render(detail),
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// How interpolated values are written into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Values are written verbatim.
    #[default]
    Plain,
    /// Values are JSON-string-escaped; `\"` inside placeholders is unescaped.
    EmbeddedJson,
}

/// Interpolation engine. Cheap to share; holds no per-render state.
pub struct TemplateEngine {
    env: Environment<'static>,
    mode: OutputMode,
}

impl TemplateEngine {
    /// Engine for plain text templates.
    pub fn new() -> Self {
        Self::with_mode(OutputMode::Plain)
    }

    /// Engine for templates that are a serialized JSON document.
    pub fn embedded_json() -> Self {
        Self::with_mode(OutputMode::EmbeddedJson)
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_keep_trailing_newline(true);
        env.set_formatter(move |out: &mut Output<'_>, _state: &State<'_, '_>, value: &Value| {
            write_value(out, value, mode)
        });
        filters::register(&mut env);
        Self { env, mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Render `template` against a Data Context.
    pub fn render(&self, template: &str, context: &DataContext) -> Result<String, TemplateError> {
        self.render_value(template, &context.to_value())
    }

    /// Render `template` against arbitrary JSON data.
    pub fn render_value(
        &self,
        template: &str,
        data: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        if !needs_engine(template) {
            return Ok(template.to_string());
        }
        let _span = tracing::debug_span!(
            "interpolate",
            operation = OP_INTERPOLATE,
            mode = ?self.mode,
            template_len = template.len(),
        )
        .entered();

        let source = syntax::to_engine_syntax(template, self.mode);
        let rendered = self
            .env
            .render_str(&source, Value::from_serialize(data))
            .map_err(TemplateError::from)?;
        Ok(rendered)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn needs_engine(template: &str) -> bool {
    template.contains("{{") || template.contains("{%") || template.contains("{#")
}

/// Serialize a non-scalar as single-quote JSON: `{'a':[1,2]}`.
pub fn single_quote_json(value: &serde_json::Value) -> String {
    value.to_string().replace('"', "'").replace('\n', "\\n")
}

/// Escape `text` for inclusion inside a JSON string literal.
fn json_escape(text: &str) -> String {
    let quoted = serde_json::Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

fn write_value(out: &mut Output<'_>, value: &Value, mode: OutputMode) -> Result<(), Error> {
    let text = match value.kind() {
        ValueKind::Undefined | ValueKind::None => return Ok(()),
        ValueKind::Seq | ValueKind::Map | ValueKind::Iterable => {
            let json = serde_json::to_value(value)
                .map_err(|e| Error::new(ErrorKind::BadSerialization, e.to_string()))?;
            single_quote_json(&json)
        }
        _ => filters::text(value),
    };
    let text = match mode {
        OutputMode::Plain => text,
        OutputMode::EmbeddedJson => json_escape(&text),
    };
    out.write_str(&text)
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write interpolated value"))
}
