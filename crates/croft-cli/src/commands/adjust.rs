//! `croft adjust`: apply move instructions and re-optimize.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use croft_io::{json::*, MoveInstructionSource, PlanSource};
use std::path::PathBuf;

#[allow(clippy::too_many_arguments)]
pub fn handle(
    plan: &PathBuf,
    moves: &PathBuf,
    fields: &PathBuf,
    crops: &PathBuf,
    weather: &PathBuf,
    rules: Option<&PathBuf>,
    config: Option<&PathBuf>,
    start: NaiveDate,
    end: NaiveDate,
    out: Option<&PathBuf>,
) -> Result<()> {
    let instance = super::load_instance(fields, crops, weather, rules, start, end)?;
    let config = super::load_config(config)?;
    let plan = JsonPlanSource { path: plan.clone() }.get()?;
    let moves = JsonMoveSource {
        path: moves.clone(),
    }
    .get_all()?;

    let result = croft_algo::adjust_allocation(&plan, &moves, &instance, &config)?;

    eprintln!(
        "applied {} move(s), rejected {}",
        result.applied_moves.len(),
        result.rejected_moves.len()
    );
    for rejected in &result.rejected_moves {
        eprintln!(
            "  rejected {} ({:?}): {}",
            rejected.instruction.allocation_id, rejected.instruction.action, rejected.reason
        );
    }
    if !result.success {
        eprintln!("no move could be applied; the plan is unchanged");
    }
    super::optimize::print_summary(&result.plan)?;

    let json = serde_json::to_string_pretty(&result).context("serializing adjust result")?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Adjust result written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
