//! The objective kernel: the single place revenue, cost and profit are
//! computed.
//!
//! Every solver, the candidate generator, the adjuster and the assembler
//! score through [`OptimizationMetrics`]; no other code may restate the
//! formulas. The contract:
//!
//! - `revenue = area_used * revenue_per_area * yield_factor *
//!   interaction_impact`, capped at `revenue_cap` when set; `None` when
//!   `revenue_per_area` is unknown
//! - `cost = growth_days * daily_fixed_cost`
//! - `profit = revenue.unwrap_or(0) - cost`
//!
//! The revenue cap applies *after* yield and interaction scaling.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Value object carrying everything the objective needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub area_used: f64,
    pub revenue_per_area: Option<f64>,
    pub revenue_cap: Option<f64>,
    pub growth_days: u32,
    pub daily_fixed_cost: f64,
    pub yield_factor: f64,
    pub interaction_impact: f64,
}

impl OptimizationMetrics {
    /// Revenue after yield and interaction scaling, capped; `None` when no
    /// revenue rate is known.
    pub fn revenue(&self) -> Option<f64> {
        self.revenue_per_area.map(|rate| {
            let raw = self.area_used * rate * self.yield_factor * self.interaction_impact;
            match self.revenue_cap {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        })
    }

    pub fn cost(&self) -> f64 {
        f64::from(self.growth_days) * self.daily_fixed_cost
    }

    pub fn profit(&self) -> f64 {
        self.revenue().unwrap_or(0.0) - self.cost()
    }

    /// Profit per occupied day; the greedy constructor's sort key.
    pub fn profit_rate(&self) -> f64 {
        if self.growth_days == 0 {
            return 0.0;
        }
        self.profit() / f64::from(self.growth_days)
    }
}

/// Which quantity the solvers optimize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    MaximizeProfit,
    MinimizeCost,
    MaximizeRevenue,
}

impl Objective {
    /// Scalar score; always maximized.
    pub fn score(&self, metrics: &OptimizationMetrics) -> f64 {
        match self {
            Objective::MaximizeProfit => metrics.profit(),
            Objective::MinimizeCost => -metrics.cost(),
            Objective::MaximizeRevenue => metrics.revenue().unwrap_or(0.0),
        }
    }

    /// Index of the best item under this objective. Ties keep the earliest
    /// item for determinism.
    pub fn select_best<T, F>(&self, items: &[T], metrics_of: F) -> Option<usize>
    where
        F: Fn(&T) -> OptimizationMetrics,
    {
        items
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                let sa = self.score(&metrics_of(a));
                let sb = self.score(&metrics_of(b));
                sa.partial_cmp(&sb)
                    .unwrap_or(Ordering::Equal)
                    // On equal score prefer the earlier index.
                    .then_with(|| ib.cmp(&ia))
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> OptimizationMetrics {
        OptimizationMetrics {
            area_used: 1000.0,
            revenue_per_area: Some(100.0),
            revenue_cap: None,
            growth_days: 120,
            daily_fixed_cost: 50.0,
            yield_factor: 1.0,
            interaction_impact: 1.0,
        }
    }

    #[test]
    fn test_revenue_cost_profit() {
        let m = metrics();
        assert_eq!(m.revenue(), Some(100_000.0));
        assert_eq!(m.cost(), 6_000.0);
        assert_eq!(m.profit(), 94_000.0);
        assert!((m.profit_rate() - 94_000.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_cap_applies_after_yield_scaling() {
        let mut m = metrics();
        m.yield_factor = 0.5;
        m.revenue_cap = Some(40_000.0);
        // 1000 * 100 * 0.5 = 50_000, capped to 40_000.
        assert_eq!(m.revenue(), Some(40_000.0));
    }

    #[test]
    fn test_interaction_impact_scales_revenue() {
        let mut m = metrics();
        m.interaction_impact = 0.5;
        assert_eq!(m.revenue(), Some(50_000.0));
    }

    #[test]
    fn test_missing_revenue_rate() {
        let mut m = metrics();
        m.revenue_per_area = None;
        assert_eq!(m.revenue(), None);
        assert_eq!(m.profit(), -6_000.0);
    }

    #[test]
    fn test_select_best_per_objective() {
        let cheap = OptimizationMetrics {
            growth_days: 10,
            ..metrics()
        };
        let rich = metrics();
        let items = vec![rich, cheap];

        let by_cost = Objective::MinimizeCost
            .select_best(&items, |m| *m)
            .unwrap();
        assert_eq!(by_cost, 1);

        let by_profit = Objective::MaximizeProfit
            .select_best(&items, |m| *m)
            .unwrap();
        // Shorter occupancy, same revenue: higher profit too.
        assert_eq!(by_profit, 1);

        let by_revenue = Objective::MaximizeRevenue
            .select_best(&items, |m| *m)
            .unwrap();
        // Equal revenue; earliest index wins.
        assert_eq!(by_revenue, 0);
    }
}
