//! CLI command definitions for the `herald` binary.
//!
//! Uses clap derive macros for argument parsing. Every command reads its
//! inputs from files (workflow YAML/JSON, context JSON, rule JSON) and prints
//! styled text, or JSON with `--json`.

pub mod render;
pub mod rule;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Render notification workflows and inspect their building blocks.
#[derive(Parser)]
#[command(name = "herald", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding config.toml (default: ~/.herald).
    #[arg(long, global = true, env = "HERALD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render every step of a workflow against a context.
    Render {
        /// Workflow definition file (.yaml, .yml or .json).
        workflow: PathBuf,

        /// Data Context JSON file ({ payload, subscriber, steps }).
        #[arg(long, short)]
        context: Option<PathBuf>,

        /// Fail on a broken skip rule instead of running the step.
        #[arg(long = "unsafe")]
        unsafe_rules: bool,
    },

    /// Render a single step's controls.
    Preview {
        /// Step type (in_app, email, sms, push, chat, delay, digest).
        step_type: String,

        /// Control values JSON file.
        controls: PathBuf,

        /// Data Context JSON file.
        #[arg(long, short)]
        context: Option<PathBuf>,
    },

    /// Interpolate a `{{ }}` template string.
    Interpolate {
        /// The template text.
        template: String,

        /// Data Context JSON file.
        #[arg(long, short)]
        context: Option<PathBuf>,
    },

    /// Evaluate a skip rule.
    #[command(name = "eval-rule")]
    EvalRule {
        /// Rule JSON file.
        rule: PathBuf,

        /// Data Context JSON file.
        #[arg(long, short)]
        context: Option<PathBuf>,

        /// Report evaluation failures as errors.
        #[arg(long = "unsafe")]
        unsafe_rules: bool,

        /// Only check the rule's structure; no evaluation.
        #[arg(long)]
        check: bool,
    },

    /// Validate a workflow definition and every step's controls.
    Validate {
        /// Workflow definition file.
        workflow: PathBuf,
    },

    /// Print the JSON Schema for a step type's controls.
    Schema {
        /// Step type (in_app, email, sms, push, chat, delay, digest).
        step_type: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
