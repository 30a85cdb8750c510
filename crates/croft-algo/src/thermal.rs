//! Thermal model: trapezoidal GDD and temperature-stress accounting.
//!
//! The daily GDD contribution of a day with mean temperature `T` under a
//! stage profile is `max(T - base, 0) * eff(T)` where `eff` is a trapezoid:
//! zero at or outside `[base, max]`, rising linearly to 1 across
//! `[base, optimal_min]`, flat at 1 across the optimal band, and falling
//! linearly to zero across `[optimal_max, max]`. This reproduces the
//! standard linear GDD inside the optimal band while zeroing contributions
//! outside the viable range (DSSAT-style).
//!
//! Stress days are tallied per stage into a [`StressAccumulator`]; the
//! yield factor applies `1 - daily_impact * count * stage_sensitivity`
//! per (stage, stress) pair, multiplicatively, floored at zero.

use croft_core::{StageRequirement, StressType, TemperatureProfile, WeatherDay};

/// Temperature-efficiency coefficient in [0, 1].
pub fn temperature_efficiency(t: f64, profile: &TemperatureProfile) -> f64 {
    if t <= profile.base_t || t >= profile.max_t {
        0.0
    } else if t < profile.optimal_min {
        (t - profile.base_t) / (profile.optimal_min - profile.base_t)
    } else if t <= profile.optimal_max {
        1.0
    } else {
        (profile.max_t - t) / (profile.max_t - profile.optimal_max)
    }
}

/// Daily GDD for a mean temperature; missing observations contribute zero.
pub fn daily_gdd(t_mean: Option<f64>, profile: &TemperatureProfile) -> f64 {
    match t_mean {
        Some(t) => (t - profile.base_t).max(0.0) * temperature_efficiency(t, profile),
        None => 0.0,
    }
}

/// Which stresses one day triggered under a stage profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StressFlags {
    pub low: bool,
    pub high: bool,
    pub frost: bool,
    pub sterility: bool,
}

impl StressFlags {
    pub fn is_set(&self, stress: StressType) -> bool {
        match stress {
            StressType::HighTemp => self.high,
            StressType::LowTemp => self.low,
            StressType::Frost => self.frost,
            StressType::Sterility => self.sterility,
        }
    }

    pub fn any(&self) -> bool {
        self.low || self.high || self.frost || self.sterility
    }
}

/// Classify one day's stress against a stage profile. Flags that need an
/// absent observation stay unset.
pub fn classify_stress(day: &WeatherDay, profile: &TemperatureProfile) -> StressFlags {
    let low = day.t_mean.is_some_and(|t| t < profile.low_stress_t);
    let high = day.t_mean.is_some_and(|t| t > profile.high_stress_t);
    let frost = day.t_min.is_some_and(|t| t <= profile.frost_t);
    let sterility = match profile.sterility_risk_t {
        Some(threshold) => day.t_max.is_some_and(|t| t >= threshold),
        None => false,
    };
    StressFlags {
        low,
        high,
        frost,
        sterility,
    }
}

/// Per-stage stress-day tallies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressAccumulator {
    counts: Vec<[u32; 4]>,
}

impl StressAccumulator {
    pub fn new(num_stages: usize) -> Self {
        StressAccumulator {
            counts: vec![[0; 4]; num_stages],
        }
    }

    pub fn record(&mut self, stage: usize, flags: StressFlags) {
        for stress in StressType::ALL {
            if flags.is_set(stress) {
                self.counts[stage][stress.index()] += 1;
            }
        }
    }

    pub fn add_count(&mut self, stage: usize, stress: StressType, count: u32) {
        self.counts[stage][stress.index()] += count;
    }

    pub fn count(&self, stage: usize, stress: StressType) -> u32 {
        self.counts[stage][stress.index()]
    }

    /// Total stress days of one kind across all stages.
    pub fn total(&self, stress: StressType) -> u32 {
        self.counts.iter().map(|c| c[stress.index()]).sum()
    }

    /// Multiplicative yield factor in [0, 1] from the accumulated stress.
    pub fn yield_factor(&self, stages: &[StageRequirement]) -> f64 {
        debug_assert_eq!(stages.len(), self.counts.len());
        let mut factor = 1.0;
        for (stage_idx, stage) in stages.iter().enumerate() {
            let impacts = stage.profile.impacts();
            let sensitivity = stage.sensitivity();
            for stress in StressType::ALL {
                let count = self.count(stage_idx, stress);
                if count > 0 {
                    let penalty =
                        impacts.get(stress) * f64::from(count) * sensitivity.get(stress);
                    factor *= (1.0 - penalty).max(0.0);
                }
            }
        }
        factor.clamp(0.0, 1.0)
    }
}
