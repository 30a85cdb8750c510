//! # croft-core: Cultivation Planning Core Model
//!
//! Provides the fundamental data structures for multi-field, multi-crop
//! cultivation planning: fields, crop thermal profiles, weather series,
//! interaction rules, allocation plans, and the objective kernel every
//! solver scores through.
//!
//! ## Design Philosophy
//!
//! A planning run is driven by an immutable [`PlanningInstance`] (fields,
//! crop profiles, weather, interaction rules, planning window) constructed
//! once and shared by reference. Solvers in `croft-algo` never mutate it;
//! they produce [`Plan`] values that own their allocations.
//!
//! All relationships are expressed through lookup keys, never pointer
//! cycles:
//! - Allocations reference fields and crops by [`FieldId`] / [`CropId`]
//! - Interaction rules match on group-name strings
//! - The instance resolves IDs through prebuilt indexes
//!
//! ## ID System
//!
//! Every element has a typed ID (newtype wrapper):
//! - [`FieldId`], [`CropId`], [`RuleId`]: string keys from source data
//! - [`AllocationId`]: a stable UUID minted when a candidate is committed
//!
//! IDs enable type safety (a field key cannot be confused with a crop key)
//! and stable references across adjust runs.
//!
//! ## Modules
//!
//! - [`field`], [`crop`], [`weather`], [`rules`] - problem-instance elements
//! - [`plan`] - candidates, committed allocations, schedules, plans
//! - [`moves`] - adjust directives
//! - [`metrics`] - the single objective kernel (revenue/cost/profit)
//! - [`config`] - algorithm configuration and objective selection
//! - [`instance`] - the immutable problem instance
//! - [`error`] - unified error type
//!
//! ## Integration with croft-io
//!
//! The croft-io crate provides source traits (files, memory) that produce
//! the element lists a [`PlanningInstance`] is assembled from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod crop;
pub mod error;
pub mod field;
pub mod instance;
pub mod metrics;
pub mod moves;
pub mod plan;
pub mod rules;
pub mod weather;

pub use config::{Algorithm, AlgorithmConfig};
pub use crop::{
    Crop, CropProfile, StageRequirement, StressImpacts, StressSensitivity, StressType,
    TemperatureProfile,
};
pub use error::{CroftError, CroftResult};
pub use field::Field;
pub use instance::PlanningInstance;
pub use metrics::{Objective, OptimizationMetrics};
pub use moves::{MoveAction, MoveInstruction};
pub use plan::{AllocationCandidate, CropAllocation, CropTotals, FieldSchedule, Plan};
pub use rules::{InteractionRule, RuleType};
pub use weather::{WeatherDay, WeatherSeries};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropId(String);
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl FieldId {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        FieldId(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CropId {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        CropId(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RuleId {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        RuleId(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of a committed allocation.
///
/// Minted (v4) when a candidate is committed into a plan; preserved across
/// adjust runs for allocations the adjuster does not touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationId(uuid::Uuid);

impl AllocationId {
    /// Mint a fresh random allocation ID.
    pub fn mint() -> Self {
        AllocationId(uuid::Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(AllocationId)
    }

    #[inline]
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed date interval over which allocations may start and must
/// complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PlanningWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> CroftResult<Self> {
        if start >= end {
            return Err(CroftError::InvalidInput(format!(
                "planning window start {} must precede end {}",
                start, end
            )));
        }
        Ok(PlanningWindow { start, end })
    }

    /// Whether `date` lies inside the window (both bounds inclusive).
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days in the window, both bounds included.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterate every date in the window in order.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take(self.num_days() as usize)
    }
}
