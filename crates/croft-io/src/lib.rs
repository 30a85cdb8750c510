//! # croft-io: Data Sources for the Planning Engine
//!
//! The engine consumes its inputs through source traits; each source is
//! responsible for its own backing (file, database, API, memory) and the
//! engine never sees the source kind. This crate defines the traits and
//! ships three backings:
//!
//! - [`memory`]: in-process vectors (tests, embedding)
//! - [`json`]: JSON files, the CLI's interchange format
//! - [`csv`]: daily weather observation rows
//!
//! All sources return `anyhow::Result` so backends can attach file/parse
//! context to their errors.

use anyhow::Result;
use croft_core::{
    CropProfile, Field, InteractionRule, MoveInstruction, Plan, WeatherSeries,
};

pub mod csv;
pub mod json;
pub mod memory;

pub trait FieldSource {
    fn get_all(&self) -> Result<Vec<Field>>;
}

pub trait CropProfileSource {
    fn get_all(&self) -> Result<Vec<CropProfile>>;
}

pub trait WeatherSource {
    fn get(&self) -> Result<WeatherSeries>;
}

pub trait InteractionRuleSource {
    fn get_rules(&self) -> Result<Vec<InteractionRule>>;
}

pub trait PlanSource {
    fn get(&self) -> Result<Plan>;
}

pub trait MoveInstructionSource {
    fn get_all(&self) -> Result<Vec<MoveInstruction>>;
}
