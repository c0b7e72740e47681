//! `render`, `preview` and `interpolate` commands.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::Value;

use herald_core::template::TemplateEngine;
use herald_infra::filesystem::{load_context_or_default, load_json, load_workflow};
use herald_types::step::StepType;

use crate::state::AppState;

/// Render a whole workflow and print one row per step.
pub async fn render_workflow(
    state: &AppState,
    workflow: &Path,
    context: Option<&Path>,
    unsafe_rules: bool,
    json: bool,
) -> Result<()> {
    let def = load_workflow(workflow).await?;
    let ctx = load_context_or_default(context).await?;

    let assembler = state.assembler(unsafe_rules);
    let plan = assembler.assemble(&def);
    let renderings = assembler
        .render_all(&def.workflow_id, &plan, &ctx)
        .await
        .with_context(|| format!("Failed to render workflow '{}'", def.workflow_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&renderings)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Step").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Output").fg(Color::White),
    ]);

    for rendering in &renderings {
        let status = match (rendering.skipped, &rendering.skip_error) {
            (true, _) => Cell::new("○ skipped").fg(Color::Yellow),
            (false, Some(_)) => Cell::new("● rendered (rule failed)").fg(Color::Magenta),
            (false, None) => Cell::new("● rendered").fg(Color::Green),
        };
        let output = rendering
            .output
            .as_ref()
            .map(|o| summarize(&Value::Object(o.values.clone())))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&rendering.step_id).fg(Color::Cyan),
            Cell::new(rendering.step_type.to_string()),
            status,
            Cell::new(output),
        ]);
    }

    let skipped = renderings.iter().filter(|r| r.skipped).count();
    println!();
    println!(
        "  {} Rendered workflow '{}'",
        style("✓").green().bold(),
        style(&def.name).cyan()
    );
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} step{}, {} skipped",
        style(renderings.len()).bold(),
        if renderings.len() == 1 { "" } else { "s" },
        style(skipped).bold()
    );
    println!();

    Ok(())
}

/// Render one step's controls and print every output field.
pub async fn preview_step(
    state: &AppState,
    step_type: &str,
    controls: &Path,
    context: Option<&Path>,
    json: bool,
) -> Result<()> {
    let step_type: StepType = step_type.parse().map_err(anyhow::Error::msg)?;
    let raw = load_json(controls).await?;
    let Value::Object(controls) = raw else {
        anyhow::bail!("{} must contain a JSON object", controls.display());
    };
    let ctx = load_context_or_default(context).await?;

    let output = state
        .output_renderer()
        .render(step_type, &controls, &ctx)
        .await
        .with_context(|| format!("Failed to render {step_type} step"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} output",
        style("✓").green().bold(),
        style(step_type).cyan()
    );
    println!();
    for (key, value) in &output.values {
        let text = match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other)?,
        };
        println!("  {}", style(format!("── {key} ──")).dim());
        for line in text.lines() {
            println!("  {line}");
        }
        println!();
    }

    Ok(())
}

/// Interpolate a template string in plain mode.
pub async fn interpolate(template: &str, context: Option<&Path>, json: bool) -> Result<()> {
    let ctx = load_context_or_default(context).await?;
    let rendered = TemplateEngine::new()
        .render(template, &ctx)
        .context("Failed to interpolate template")?;

    if json {
        println!("{}", serde_json::json!({ "output": rendered }));
    } else {
        println!("{rendered}");
    }
    Ok(())
}

/// One-line summary of a step output for the table.
fn summarize(value: &Value) -> String {
    let text = match value.get("body").or_else(|| value.get("cron")) {
        Some(Value::String(s)) => s.clone(),
        _ => value.to_string(),
    };
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 60 {
        format!("{}...", flat.chars().take(57).collect::<String>())
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_prefers_body() {
        assert_eq!(summarize(&json!({ "subject": "s", "body": "Hello\n  world" })), "Hello world");
        assert_eq!(summarize(&json!({ "cron": "0 9 * * *", "type": "timed" })), "0 9 * * *");
    }

    #[test]
    fn test_summarize_truncates() {
        let long = "x".repeat(100);
        let summary = summarize(&json!({ "body": long }));
        assert_eq!(summary.chars().count(), 60);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summarize_falls_back_to_json() {
        assert_eq!(
            summarize(&json!({ "amount": 1, "unit": "days" })),
            r#"{"amount":1,"unit":"days"}"#
        );
    }
}
