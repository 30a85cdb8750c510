//! `croft period`: best start dates for one (field, crop) pair.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use croft_core::{CropId, FieldId};
use std::io::Write;
use std::path::PathBuf;
use tabwriter::TabWriter;

#[allow(clippy::too_many_arguments)]
pub fn handle(
    fields: &PathBuf,
    crops: &PathBuf,
    weather: &PathBuf,
    field: &str,
    crop: &str,
    config: Option<&PathBuf>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let instance = super::load_instance(fields, crops, weather, None, start, end)?;
    let config = super::load_config(config)?;

    let field_id = FieldId::new(field);
    let crop_id = CropId::new(crop);
    let Some(field) = instance.field(&field_id) else {
        bail!("unknown field id {}", field_id);
    };
    let Some(profile) = instance.profile(&crop_id) else {
        bail!("unknown crop id {}", crop_id);
    };

    let result = croft_algo::optimize_period(
        field,
        profile,
        instance.weather(),
        instance.window(),
        &config,
    )
    .context("period optimization")?;

    if result.candidates.is_empty() {
        bail!(
            "no feasible cultivation period for {} on {}",
            crop_id,
            field_id
        );
    }

    let mut tw = TabWriter::new(std::io::stdout());
    writeln!(
        tw,
        "start\tcompletion\tdays\tyield\tcost\trevenue\tprofit"
    )?;
    for candidate in &result.candidates {
        writeln!(
            tw,
            "{}\t{}\t{}\t{:.3}\t{:.2}\t{}\t{:.2}",
            candidate.start_date,
            candidate.completion_date,
            candidate.growth_days,
            candidate.yield_factor,
            candidate.cost,
            candidate
                .revenue
                .map_or_else(|| "-".to_string(), |r| format!("{:.2}", r)),
            candidate.profit
        )?;
    }
    tw.flush()?;
    Ok(())
}
