//! Shared domain types for Herald.
//!
//! This crate contains the core domain types used across the Herald rendering
//! core: the rich-text Document Node tree, the Data Context, workflow and step
//! definitions, typed control-value shapes, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, thiserror, schemars.

pub mod config;
pub mod context;
pub mod controls;
pub mod document;
pub mod error;
pub mod step;
pub mod workflow;
