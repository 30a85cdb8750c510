//! `croft optimize`: full allocation planning.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use croft_core::Plan;
use std::io::Write;
use std::path::PathBuf;
use tabwriter::TabWriter;

#[allow(clippy::too_many_arguments)]
pub fn handle(
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

    let plan = croft_algo::optimize_allocation(&instance, &config)?;
    print_summary(&plan)?;

    match out {
        Some(path) => {
            croft_io::json::write_plan(path, &plan)?;
            println!("Plan written to {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&plan).context("serializing plan")?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Per-field summary table.
pub fn print_summary(plan: &Plan) -> Result<()> {
    let mut tw = TabWriter::new(std::io::stderr());
    writeln!(tw, "field\tallocations\tcost\trevenue\tprofit")?;
    for schedule in &plan.field_schedules {
        writeln!(
            tw,
            "{}\t{}\t{:.2}\t{:.2}\t{:.2}",
            schedule.field_id,
            schedule.allocations.len(),
            schedule.total_cost,
            schedule.total_revenue,
            schedule.total_profit
        )?;
    }
    writeln!(
        tw,
        "total\t{}\t{:.2}\t{:.2}\t{:.2}",
        plan.allocation_count(),
        plan.total_cost,
        plan.total_revenue,
        plan.total_profit
    )?;
    tw.flush()?;
    if plan.timed_out {
        eprintln!("warning: time limit reached; the plan may be suboptimal");
    }
    Ok(())
}
