//! Infrastructure layer for Herald.
//!
//! Implements the ports defined in `herald-core`: the HTML markup renderer
//! for email bodies, the `config.toml` loader, and filesystem loaders for
//! workflow, context and rule files.

pub mod config;
pub mod filesystem;
pub mod markup;
