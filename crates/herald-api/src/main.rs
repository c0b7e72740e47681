//! Herald CLI entry point.
//!
//! Binary name: `herald`
//!
//! Parses CLI arguments, loads configuration, initializes tracing, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing::instrument::WithSubscriber;

use cli::{Cli, Commands};
use herald_observe::tracing_setup::{
    bootstrap_subscriber, filter_for_verbosity, init_tracing, shutdown_tracing,
};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "herald", &mut std::io::stdout());
        return Ok(());
    }

    let filter = filter_for_verbosity(cli.verbose, cli.quiet);

    // Config decides whether OTel is on, so load it under a scoped subscriber.
    let state = AppState::init(cli.data_dir.clone())
        .with_subscriber(bootstrap_subscriber(filter))
        .await;

    init_tracing(filter, state.config.telemetry.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli, &state).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: &AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Render {
            workflow,
            context,
            unsafe_rules,
        } => {
            cli::render::render_workflow(state, &workflow, context.as_deref(), unsafe_rules, cli.json)
                .await
        }

        Commands::Preview {
            step_type,
            controls,
            context,
        } => {
            cli::render::preview_step(state, &step_type, &controls, context.as_deref(), cli.json)
                .await
        }

        Commands::Interpolate { template, context } => {
            cli::render::interpolate(&template, context.as_deref(), cli.json).await
        }

        Commands::EvalRule {
            rule,
            context,
            unsafe_rules,
            check,
        } => {
            cli::rule::eval_rule(state, &rule, context.as_deref(), unsafe_rules, check, cli.json)
                .await
        }

        Commands::Validate { workflow } => cli::validate::validate_workflow(&workflow, cli.json).await,

        Commands::Schema { step_type } => cli::validate::print_schema(&step_type),

        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
