//! Period optimization: best start dates for one (field, crop) pair.
//!
//! Enumerates every start date in the planning window, evaluates growth
//! for each, and returns the top-K candidates under the configured
//! objective (profit when a revenue rate is known, otherwise the kernel
//! scores `-cost`).
//!
//! When every stage shares one thermal profile, evaluation runs on
//! precomputed per-day GDD and stress-flag prefix tables: each start date
//! is answered with binary searches instead of a day-by-day walk,
//! amortizing the whole enumeration to O(N log N) over an N-day window.
//! Heterogeneous per-stage profiles fall back to the full walk; both
//! paths produce identical results for uniform profiles.

use crate::growth::simulate_growth;
use crate::thermal::{classify_stress, daily_gdd, StressAccumulator};
use chrono::NaiveDate;
use croft_core::{
    AlgorithmConfig, CropId, CropProfile, CroftResult, Field, FieldId, OptimizationMetrics,
    PlanningWindow, StressType, WeatherSeries,
};
use serde::{Deserialize, Serialize};

/// One evaluated start date at full field capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodCandidate {
    pub start_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub growth_days: u32,
    pub yield_factor: f64,
    pub cost: f64,
    pub revenue: Option<f64>,
    pub profit: f64,
}

/// Top-K start dates for a (field, crop), best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    pub field_id: FieldId,
    pub crop_id: CropId,
    /// Area evaluated (full capacity in whole plant units).
    pub area_used: f64,
    pub quantity: u32,
    pub candidates: Vec<PeriodCandidate>,
}

impl PeriodResult {
    pub fn best(&self) -> Option<&PeriodCandidate> {
        self.candidates.first()
    }
}

/// Completion summary shared by both evaluation paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GrowthSummary {
    pub completion_date: NaiveDate,
    pub growth_days: u32,
    pub yield_factor: f64,
}

/// Evaluate every feasible start date for a (field, crop) pair and return
/// the top-K candidates under the configured objective.
pub fn optimize_period(
    field: &Field,
    profile: &CropProfile,
    weather: &WeatherSeries,
    window: &PlanningWindow,
    config: &AlgorithmConfig,
) -> CroftResult<PeriodResult> {
    field.validate()?;
    profile.validate()?;

    let quantity = (field.area_m2 / profile.crop.area_per_unit).floor() as u32;
    let area_used = f64::from(quantity) * profile.crop.area_per_unit;
    let mut result = PeriodResult {
        field_id: field.id.clone(),
        crop_id: profile.crop.id.clone(),
        area_used,
        quantity,
        candidates: Vec::new(),
    };
    if quantity == 0 {
        return Ok(result);
    }

    let summaries = if profile.uniform_thermal() {
        evaluate_starts_prefix(profile, weather, window)
    } else {
        evaluate_starts_walk(profile, weather, window)
    };

    let mut candidates: Vec<PeriodCandidate> = summaries
        .into_iter()
        // Same-day completion cannot form a valid allocation interval.
        .filter(|(start, summary)| summary.completion_date > *start)
        .map(|(start, summary)| {
            let metrics = OptimizationMetrics {
                area_used,
                revenue_per_area: profile.crop.revenue_per_area,
                revenue_cap: profile.crop.revenue_cap,
                growth_days: summary.growth_days,
                daily_fixed_cost: field.daily_fixed_cost,
                yield_factor: summary.yield_factor,
                interaction_impact: 1.0,
            };
            PeriodCandidate {
                start_date: start,
                completion_date: summary.completion_date,
                growth_days: summary.growth_days,
                yield_factor: summary.yield_factor,
                cost: metrics.cost(),
                revenue: metrics.revenue(),
                profit: metrics.profit(),
            }
        })
        .collect();

    let objective = config.objective;
    candidates.sort_by(|a, b| {
        let sa = objective.score(&period_metrics(a, area_used, field.daily_fixed_cost, profile));
        let sb = objective.score(&period_metrics(b, area_used, field.daily_fixed_cost, profile));
        sb.partial_cmp(&sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.start_date.cmp(&b.start_date))
    });
    candidates.truncate(config.top_period_candidates);
    result.candidates = candidates;
    Ok(result)
}

fn period_metrics(
    candidate: &PeriodCandidate,
    area_used: f64,
    daily_fixed_cost: f64,
    profile: &CropProfile,
) -> OptimizationMetrics {
    OptimizationMetrics {
        area_used,
        revenue_per_area: profile.crop.revenue_per_area,
        revenue_cap: profile.crop.revenue_cap,
        growth_days: candidate.growth_days,
        daily_fixed_cost,
        yield_factor: candidate.yield_factor,
        interaction_impact: 1.0,
    }
}

/// Full day-by-day walk per start date. Always correct; used when stage
/// thermal profiles differ.
pub(crate) fn evaluate_starts_walk(
    profile: &CropProfile,
    weather: &WeatherSeries,
    window: &PlanningWindow,
) -> Vec<(NaiveDate, GrowthSummary)> {
    window
        .iter_days()
        .filter_map(|start| {
            simulate_growth(profile, start, weather, window.end)
                .matured()
                .map(|result| {
                    (
                        start,
                        GrowthSummary {
                            completion_date: result.completion_date,
                            growth_days: result.growth_days,
                            yield_factor: result.yield_factor,
                        },
                    )
                })
        })
        .collect()
}

/// Prefix-table evaluation for profiles whose stages share one thermal
/// profile. Per-day GDD and stress flags are computed once for the whole
/// window; each start date is then resolved with binary searches over
/// the GDD prefix.
pub(crate) fn evaluate_starts_prefix(
    profile: &CropProfile,
    weather: &WeatherSeries,
    window: &PlanningWindow,
) -> Vec<(NaiveDate, GrowthSummary)> {
    let thermal = &profile.stages[0].profile;
    let dates: Vec<NaiveDate> = window.iter_days().collect();
    let n = dates.len();

    // prefix[i] = GDD accumulated over dates[0..i]; stress prefixes
    // likewise count flagged days.
    let mut gdd_prefix = Vec::with_capacity(n + 1);
    gdd_prefix.push(0.0);
    let mut stress_prefix: [Vec<u32>; 4] = std::array::from_fn(|_| {
        let mut v = Vec::with_capacity(n + 1);
        v.push(0);
        v
    });
    for date in &dates {
        let (gdd, flags) = match weather.get(*date) {
            Some(day) => (daily_gdd(day.t_mean, thermal), classify_stress(day, thermal)),
            None => (0.0, Default::default()),
        };
        gdd_prefix.push(gdd_prefix.last().unwrap() + gdd);
        for stress in StressType::ALL {
            let k = stress.index();
            let last = *stress_prefix[k].last().unwrap();
            stress_prefix[k].push(last + u32::from(flags.is_set(stress)));
        }
    }

    let total_required = profile.total_required_gdd();
    let thresholds = profile.stage_thresholds();
    let mut out = Vec::new();

    for s in 0..n {
        // First index d (in prefix space) with cumulative GDD since s
        // reaching the total; the completion day is d - 1.
        let Some(d) = first_reaching(&gdd_prefix, s, total_required) else {
            continue;
        };
        let e = d - 1;
        let growth_days = (e - s) as u32 + 1;

        // Stage k occupies prefix indices [lo_k, hi_k); count each
        // stress kind from the flag prefixes.
        let mut stress = StressAccumulator::new(profile.stages.len());
        let mut lo = s;
        for (k, threshold) in thresholds.iter().enumerate() {
            let hi = if k + 1 == thresholds.len() {
                e + 1
            } else {
                first_reaching(&gdd_prefix, s, *threshold).map_or(e + 1, |idx| idx.min(e + 1))
            };
            for kind in StressType::ALL {
                let count =
                    stress_prefix[kind.index()][hi] - stress_prefix[kind.index()][lo];
                stress.add_count(k, kind, count);
            }
            lo = hi;
        }

        out.push((
            dates[s],
            GrowthSummary {
                completion_date: dates[e],
                growth_days,
                yield_factor: stress.yield_factor(&profile.stages),
            },
        ));
    }
    out
}

/// Smallest prefix index `d > s` with `prefix[d] - prefix[s] >= target`,
/// or `None` when the window never accumulates enough.
fn first_reaching(prefix: &[f64], s: usize, target: f64) -> Option<usize> {
    let goal = prefix[s] + target;
    let d = prefix.partition_point(|&v| v < goal);
    (d < prefix.len()).then_some(d.max(s + 1))
}
