//! In-memory sources for tests and embedding.

use crate::{
    CropProfileSource, FieldSource, InteractionRuleSource, MoveInstructionSource, PlanSource,
    WeatherSource,
};
use anyhow::Result;
use croft_core::{CropProfile, Field, InteractionRule, MoveInstruction, Plan, WeatherSeries};

#[derive(Debug, Clone)]
pub struct InMemoryFieldSource(pub Vec<Field>);

impl FieldSource for InMemoryFieldSource {
    fn get_all(&self) -> Result<Vec<Field>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCropProfileSource(pub Vec<CropProfile>);

impl CropProfileSource for InMemoryCropProfileSource {
    fn get_all(&self) -> Result<Vec<CropProfile>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryWeatherSource(pub WeatherSeries);

impl WeatherSource for InMemoryWeatherSource {
    fn get(&self) -> Result<WeatherSeries> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryRuleSource(pub Vec<InteractionRule>);

impl InteractionRuleSource for InMemoryRuleSource {
    fn get_rules(&self) -> Result<Vec<InteractionRule>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryPlanSource(pub Plan);

impl PlanSource for InMemoryPlanSource {
    fn get(&self) -> Result<Plan> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryMoveSource(pub Vec<MoveInstruction>);

impl MoveInstructionSource for InMemoryMoveSource {
    fn get_all(&self) -> Result<Vec<MoveInstruction>> {
        Ok(self.0.clone())
    }
}
