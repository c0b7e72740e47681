//! `validate` and `schema` commands.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::Value;

use herald_core::controls::{control_schema, validate_controls};
use herald_core::rules::RuleEvaluator;
use herald_infra::filesystem::load_workflow;
use herald_types::step::StepType;

/// Outcome of checking one step.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StepCheck {
    step_id: String,
    step_type: StepType,
    valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    problems: Vec<String>,
}

/// Validate a workflow file and every step's controls and skip rule.
///
/// Exits non-zero when any step has a problem.
pub async fn validate_workflow(workflow: &Path, json: bool) -> Result<()> {
    let def = load_workflow(workflow).await?;
    let evaluator = RuleEvaluator::new();

    let checks: Vec<StepCheck> = def
        .steps
        .iter()
        .map(|step| {
            let mut problems = Vec::new();
            if let Err(err) = validate_controls(step.step_type, &Value::Object(step.controls.clone())) {
                problems.push(err.to_string());
            }
            if let Some(rule) = step.skip_rule() {
                if !evaluator.is_valid_rule(rule) {
                    problems.push("skip rule is malformed".to_string());
                }
            }
            StepCheck {
                step_id: step.step_id.clone(),
                step_type: step.step_type,
                valid: problems.is_empty(),
                problems,
            }
        })
        .collect();
    let invalid = checks.iter().filter(|c| !c.valid).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Step").fg(Color::White),
            Cell::new("Type").fg(Color::White),
            Cell::new("Result").fg(Color::White),
        ]);
        for check in &checks {
            let result = if check.valid {
                Cell::new("✓ ok").fg(Color::Green)
            } else {
                Cell::new(format!("✗ {}", check.problems.join("; "))).fg(Color::Red)
            };
            table.add_row(vec![
                Cell::new(&check.step_id).fg(Color::Cyan),
                Cell::new(check.step_type.to_string()),
                result,
            ]);
        }
        println!();
        println!("  Workflow '{}'", style(&def.name).cyan());
        println!();
        println!("{table}");
        println!();
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} of {} steps failed validation", checks.len());
    }
    Ok(())
}

/// Print the control JSON Schema for a step type.
pub fn print_schema(step_type: &str) -> Result<()> {
    let step_type: StepType = step_type.parse().map_err(anyhow::Error::msg)?;
    println!("{}", serde_json::to_string_pretty(&control_schema(step_type))?);
    Ok(())
}
