//! Observability for Herald: tracing subscriber setup and span attribute
//! conventions shared by the rendering core and the CLI.

pub mod render_attrs;
pub mod tracing_setup;
