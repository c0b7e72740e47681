//! Rendering core for Herald.
//!
//! Turns a step's control values plus a Data Context into channel output:
//! document expansion, `{{ }}` interpolation, control sanitization, skip-rule
//! evaluation, and per-channel renderers. Defines the `MarkupRenderer` port
//! that the infrastructure layer implements. Depends only on `herald-types`
//! and `herald-observe` -- never on `herald-infra`.

pub mod controls;
pub mod document;
pub mod path;
pub mod render;
pub mod rules;
pub mod template;
pub mod workflow;
