//! `eval-rule` command.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use herald_core::rules::RuleEvaluator;
use herald_infra::filesystem::{load_context_or_default, load_json};

use crate::state::AppState;

/// Evaluate a rule file against a context, or only check its structure.
pub async fn eval_rule(
    state: &AppState,
    rule: &Path,
    context: Option<&Path>,
    unsafe_rules: bool,
    check: bool,
    json: bool,
) -> Result<()> {
    let rule = load_json(rule).await?;
    let evaluator = RuleEvaluator::new();

    if check {
        let valid = evaluator.is_valid_rule(&rule);
        if json {
            println!("{}", serde_json::json!({ "valid": valid }));
        } else if valid {
            println!("  {} Rule is well-formed", style("✓").green().bold());
        } else {
            println!("  {} Rule is malformed", style("✗").red().bold());
        }
        return Ok(());
    }

    let ctx = load_context_or_default(context).await?;
    let outcome = evaluator
        .evaluate_in_context(&rule, &ctx, state.evaluation_mode(unsafe_rules))
        .context("Rule evaluation failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "result": outcome.result,
                "error": outcome.error,
            }))?
        );
        return Ok(());
    }

    let verdict = if outcome.result {
        style("true").green().bold()
    } else {
        style("false").red().bold()
    };
    println!("  {} {verdict}", style("Result:").bold());
    if let Some(error) = &outcome.error {
        println!("  {} {}", style("Error:").bold(), style(error).yellow());
    }
    Ok(())
}
