//! JSON-file sources and the plan codec.
//!
//! Element lists are stored as plain JSON arrays; weather as an array of
//! daily observations (the series is validated for contiguity on load).

use crate::{
    CropProfileSource, FieldSource, InteractionRuleSource, MoveInstructionSource, PlanSource,
    WeatherSource,
};
use anyhow::{Context, Result};
use croft_core::{
    CropProfile, Field, InteractionRule, MoveInstruction, Plan, WeatherDay, WeatherSeries,
};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

/// Write a plan as pretty-printed JSON.
pub fn write_plan(path: &Path, plan: &Plan) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), plan)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Read a plan back from JSON.
pub fn read_plan(path: &Path) -> Result<Plan> {
    read_json(path)
}

#[derive(Debug, Clone)]
pub struct JsonFieldSource {
    pub path: PathBuf,
}

impl FieldSource for JsonFieldSource {
    fn get_all(&self) -> Result<Vec<Field>> {
        read_json(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct JsonCropProfileSource {
    pub path: PathBuf,
}

impl CropProfileSource for JsonCropProfileSource {
    fn get_all(&self) -> Result<Vec<CropProfile>> {
        read_json(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct JsonWeatherSource {
    pub path: PathBuf,
}

impl WeatherSource for JsonWeatherSource {
    fn get(&self) -> Result<WeatherSeries> {
        let days: Vec<WeatherDay> = read_json(&self.path)?;
        WeatherSeries::from_days(days)
            .with_context(|| format!("validating weather series {}", self.path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct JsonRuleSource {
    pub path: PathBuf,
}

impl InteractionRuleSource for JsonRuleSource {
    fn get_rules(&self) -> Result<Vec<InteractionRule>> {
        read_json(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct JsonPlanSource {
    pub path: PathBuf,
}

impl PlanSource for JsonPlanSource {
    fn get(&self) -> Result<Plan> {
        read_json(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct JsonMoveSource {
    pub path: PathBuf,
}

impl MoveInstructionSource for JsonMoveSource {
    fn get_all(&self) -> Result<Vec<MoveInstruction>> {
        read_json(&self.path)
    }
}
