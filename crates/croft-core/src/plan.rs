//! Candidates, committed allocations, per-field schedules and plans.

use crate::{AllocationId, CropId, FieldId, OptimizationMetrics};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A proposed allocation under evaluation; not yet in a plan.
///
/// Candidates reference their field and crop by ID and carry the numeric
/// snapshot needed for scoring, so solvers never reach back into the
/// problem instance on the hot path. Derived metrics come only from
/// [`OptimizationMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationCandidate {
    pub field_id: FieldId,
    pub crop_id: CropId,
    pub crop_name: String,
    pub start_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub growth_days: u32,
    /// Ground area occupied (m^2); never exceeds the field area.
    pub area_used: f64,
    /// Whole plant units; `area_used = quantity * crop.area_per_unit`.
    pub quantity: u32,
    pub yield_factor: f64,
    pub daily_fixed_cost: f64,
    pub revenue_per_area: Option<f64>,
    pub revenue_cap: Option<f64>,
}

impl AllocationCandidate {
    /// Metrics with no interaction effect (impact 1.0).
    pub fn metrics(&self) -> OptimizationMetrics {
        self.metrics_with_impact(1.0)
    }

    /// Metrics under a given interaction impact multiplier.
    pub fn metrics_with_impact(&self, interaction_impact: f64) -> OptimizationMetrics {
        OptimizationMetrics {
            area_used: self.area_used,
            revenue_per_area: self.revenue_per_area,
            revenue_cap: self.revenue_cap,
            growth_days: self.growth_days,
            daily_fixed_cost: self.daily_fixed_cost,
            yield_factor: self.yield_factor,
            interaction_impact,
        }
    }

    /// Whether this candidate's occupancy (including the trailing fallow
    /// rest) collides with an interval starting at `start` and completing
    /// at `completion` on the same field.
    ///
    /// The later interval must start at least `fallow_days` after the
    /// earlier one completes; occupancy of the completion day itself
    /// keeps the minimum gap at one day even when the fallow period is
    /// zero.
    pub fn conflicts_with(
        &self,
        start: NaiveDate,
        completion: NaiveDate,
        fallow_days: i64,
    ) -> bool {
        let rest = chrono::Duration::days(fallow_days.max(1));
        // Either interval must end, rest included, by the other's start.
        !(completion + rest <= self.start_date || self.completion_date + rest <= start)
    }
}

/// The committed form of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropAllocation {
    pub allocation_id: AllocationId,
    pub crop_id: CropId,
    pub crop_name: String,
    pub start_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub growth_days: u32,
    pub area_used: f64,
    pub quantity: u32,
    pub total_cost: f64,
    pub expected_revenue: f64,
    pub profit: f64,
    pub yield_factor: f64,
    #[serde(default = "default_impact")]
    pub interaction_impact: f64,
}

fn default_impact() -> f64 {
    1.0
}

/// One field's committed allocations, ordered by start date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchedule {
    pub field_id: FieldId,
    pub field_name: String,
    pub allocations: Vec<CropAllocation>,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub total_profit: f64,
}

/// Per-crop aggregate across the whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropTotals {
    pub crop_id: CropId,
    pub crop_name: String,
    pub allocation_count: usize,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_cap: Option<f64>,
}

/// The planning result: per-field schedules plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub optimization_id: String,
    /// Solver tag: `dp`, `greedy`, `greedy+alns`, `adjust+dp`, ...
    pub algorithm_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Soft signal: the solver hit its deadline and the plan may be
    /// suboptimal.
    #[serde(default)]
    pub timed_out: bool,
    pub total_profit: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub field_schedules: Vec<FieldSchedule>,
    #[serde(default)]
    pub crop_totals: Vec<CropTotals>,
    /// Count of (field, crop) pairs skipped because no feasible period
    /// exists.
    #[serde(default)]
    pub infeasible_pairs: usize,
}

impl Plan {
    /// Iterate every allocation in the plan.
    pub fn allocations(&self) -> impl Iterator<Item = &CropAllocation> {
        self.field_schedules.iter().flat_map(|s| s.allocations.iter())
    }

    pub fn allocation_count(&self) -> usize {
        self.field_schedules.iter().map(|s| s.allocations.len()).sum()
    }

    /// Find an allocation and its field by ID.
    pub fn find_allocation(&self, id: AllocationId) -> Option<(&FieldId, &CropAllocation)> {
        self.field_schedules.iter().find_map(|s| {
            s.allocations
                .iter()
                .find(|a| a.allocation_id == id)
                .map(|a| (&s.field_id, a))
        })
    }
}
