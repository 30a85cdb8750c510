//! Algorithm configuration.

use crate::metrics::Objective;
use crate::{CroftError, CroftResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Main solver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Per-field weighted-interval dynamic programming.
    #[default]
    Dp,
    /// Greedy construction, optionally refined by local search / ALNS.
    Greedy,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Dp => f.write_str("dp"),
            Algorithm::Greedy => f.write_str("greedy"),
        }
    }
}

/// Full solver configuration with the documented defaults.
///
/// All fields have serde defaults so a partial JSON config is accepted;
/// [`AlgorithmConfig::validate`] rejects out-of-domain values with
/// `InvalidInput`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmConfig {
    pub algorithm: Algorithm,
    pub objective: Objective,
    /// Apply hill climbing after the greedy constructor.
    pub enable_local_search: bool,
    /// Use ALNS after (in place of plain hill climbing when both are set).
    pub enable_alns: bool,
    pub alns_iterations: u32,
    /// Fraction of allocations removed per destroy step, in (0, 1).
    pub alns_removal_rate: f64,
    pub sa_initial_temperature: f64,
    /// Temperature decay per iteration, in (0, 1).
    pub sa_cooling_rate: f64,
    pub local_search_max_iterations: u32,
    /// Wall-clock budget; `None` means unbounded.
    pub time_limit_seconds: Option<f64>,
    /// Area fractions enumerated per (field, crop), each in (0, 1].
    pub quantity_levels: Vec<f64>,
    /// K best start dates kept per (field, crop).
    pub top_period_candidates: usize,
    pub enable_candidate_filtering: bool,
    pub min_profit_rate_threshold: f64,
    /// Step size of the period-shift operator (days).
    pub period_shift_days: i64,
    /// Initial ALNS operator weights by operator name; unnamed operators
    /// start at 1.0.
    pub operator_weights: BTreeMap<String, f64>,
    /// PRNG seed for reproducibility.
    pub seed: u64,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig {
            algorithm: Algorithm::Dp,
            objective: Objective::MaximizeProfit,
            enable_local_search: true,
            enable_alns: false,
            alns_iterations: 200,
            alns_removal_rate: 0.3,
            sa_initial_temperature: 10_000.0,
            sa_cooling_rate: 0.99,
            local_search_max_iterations: 200,
            time_limit_seconds: None,
            quantity_levels: vec![1.0, 0.75, 0.5, 0.25],
            top_period_candidates: 3,
            enable_candidate_filtering: true,
            min_profit_rate_threshold: 0.0,
            period_shift_days: 7,
            operator_weights: BTreeMap::new(),
            seed: 42,
        }
    }
}

impl AlgorithmConfig {
    pub fn validate(&self) -> CroftResult<()> {
        fn bad(msg: String) -> CroftResult<()> {
            Err(CroftError::InvalidInput(msg))
        }

        if self.alns_iterations == 0 {
            return bad("alns_iterations must be positive".into());
        }
        if !(self.alns_removal_rate > 0.0 && self.alns_removal_rate < 1.0) {
            return bad(format!(
                "alns_removal_rate must be in (0, 1), got {}",
                self.alns_removal_rate
            ));
        }
        if !(self.sa_initial_temperature > 0.0) {
            return bad(format!(
                "sa_initial_temperature must be positive, got {}",
                self.sa_initial_temperature
            ));
        }
        if !(self.sa_cooling_rate > 0.0 && self.sa_cooling_rate < 1.0) {
            return bad(format!(
                "sa_cooling_rate must be in (0, 1), got {}",
                self.sa_cooling_rate
            ));
        }
        if self.local_search_max_iterations == 0 {
            return bad("local_search_max_iterations must be positive".into());
        }
        if let Some(limit) = self.time_limit_seconds {
            if !(limit > 0.0) {
                return bad(format!(
                    "time_limit_seconds must be positive, got {}",
                    limit
                ));
            }
        }
        if self.quantity_levels.is_empty() {
            return bad("quantity_levels must be non-empty".into());
        }
        for &level in &self.quantity_levels {
            if !(level > 0.0 && level <= 1.0) {
                return bad(format!(
                    "quantity levels must be in (0, 1], got {}",
                    level
                ));
            }
        }
        if self.top_period_candidates == 0 {
            return bad("top_period_candidates must be positive".into());
        }
        if self.period_shift_days <= 0 {
            return bad(format!(
                "period_shift_days must be positive, got {}",
                self.period_shift_days
            ));
        }
        for (name, weight) in &self.operator_weights {
            if !(weight > &0.0) {
                return bad(format!(
                    "operator weight for {} must be positive, got {}",
                    name, weight
                ));
            }
        }
        Ok(())
    }
}
