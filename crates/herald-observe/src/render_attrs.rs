//! Span attribute conventions for render operations.
//!
//! Spans opened by the rendering core carry an `operation` field whose value
//! is one of the `OP_*` constants below, plus `step_id` / `step_type` where a
//! step is known. Keeping the values here lets log queries and OpenTelemetry
//! dashboards match on stable strings.
//!
//! Span naming convention: `"{operation}"` (e.g., `"render_step"`)

// --- Operation name values ---

/// Rendering a single step's controls into channel output.
pub const OP_RENDER_STEP: &str = "render_step";

/// Expanding a document tree (conditionals, iterations, variables).
pub const OP_EXPAND_DOCUMENT: &str = "expand_document";

/// Interpolating `{{ }}` placeholders in a template string.
pub const OP_INTERPOLATE: &str = "interpolate";

/// Evaluating a step's skip rule.
pub const OP_EVALUATE_SKIP: &str = "evaluate_skip";

/// Rendering every step of a workflow.
pub const OP_RENDER_WORKFLOW: &str = "render_workflow";

// --- Service name ---

/// Service name reported to OpenTelemetry.
pub const SERVICE_NAME: &str = "herald";
