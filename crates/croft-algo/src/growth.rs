//! Growth-progress evaluation: from a start date to completion or not.
//!
//! Walks the weather forward one day at a time, determining the active
//! stage from cumulative GDD, accruing the day's GDD and stress into that
//! stage. Completion occurs on the first day whose cumulative GDD reaches
//! the profile's total requirement. Weather gaps contribute zero GDD
//! (conservative), so a start whose completion would fall past the
//! observed series naturally reports [`GrowthOutcome::Incomplete`].
//!
//! Deterministic: identical inputs always produce identical output.

use crate::thermal::{classify_stress, daily_gdd, StressAccumulator, StressFlags};
use chrono::{Duration, NaiveDate};
use croft_core::{CropProfile, WeatherSeries};

/// One day of the progress timeline, for tests and display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyProgress {
    pub date: NaiveDate,
    /// 0-based index of the stage active during this day.
    pub stage_index: usize,
    pub daily_gdd: f64,
    pub cumulative_gdd: f64,
}

/// A completed growth simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthResult {
    pub start_date: NaiveDate,
    pub completion_date: NaiveDate,
    /// Occupancy in days, start and completion both included.
    pub growth_days: u32,
    pub yield_factor: f64,
    pub stress: StressAccumulator,
    pub timeline: Vec<DailyProgress>,
}

/// Result of walking a start date forward.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthOutcome {
    Matured(GrowthResult),
    /// Required GDD was not reached by the planning-window end; the caller
    /// discards this start date as infeasible.
    Incomplete,
}

impl GrowthOutcome {
    pub fn matured(self) -> Option<GrowthResult> {
        match self {
            GrowthOutcome::Matured(result) => Some(result),
            GrowthOutcome::Incomplete => None,
        }
    }
}

/// Simulate growth from `start` until completion or `window_end`.
pub fn simulate_growth(
    profile: &CropProfile,
    start: NaiveDate,
    weather: &WeatherSeries,
    window_end: NaiveDate,
) -> GrowthOutcome {
    let total_required = profile.total_required_gdd();
    let mut stress = StressAccumulator::new(profile.stages.len());
    let mut timeline = Vec::new();
    let mut cumulative = 0.0;
    let mut date = start;

    while date <= window_end {
        let stage_index = profile.stage_at(cumulative);
        let stage_profile = &profile.stages[stage_index].profile;
        let (gdd, flags) = match weather.get(date) {
            Some(day) => (
                daily_gdd(day.t_mean, stage_profile),
                classify_stress(day, stage_profile),
            ),
            None => (0.0, StressFlags::default()),
        };
        cumulative += gdd;
        stress.record(stage_index, flags);
        timeline.push(DailyProgress {
            date,
            stage_index,
            daily_gdd: gdd,
            cumulative_gdd: cumulative,
        });

        if cumulative >= total_required {
            let growth_days = (date - start).num_days() as u32 + 1;
            let yield_factor = stress.yield_factor(&profile.stages);
            return GrowthOutcome::Matured(GrowthResult {
                start_date: start,
                completion_date: date,
                growth_days,
                yield_factor,
                stress,
                timeline,
            });
        }
        date += Duration::days(1);
    }

    GrowthOutcome::Incomplete
}
