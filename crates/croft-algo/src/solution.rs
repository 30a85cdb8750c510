//! Working solution state and its evaluation.
//!
//! Solvers operate on [`SolutionState`] values: a flat list of placements
//! referencing pool candidates (or owned synthetic candidates injected by
//! the adjuster and the quantity operator). States are cheap to clone;
//! the shared problem context ([`PlanContext`]) is borrowed, never copied.
//!
//! [`PlanContext::evaluate`] is the one evaluation path: it recomputes
//! interaction impacts per field timeline, scores every placement through
//! the objective kernel, and trims per-crop revenue to the configured
//! caps (decreasing-profit order), so no solver can accept a neighbor on
//! phantom revenue.

use crate::candidates::CandidatePool;
use crate::interaction::RuleIndex;
use chrono::NaiveDate;
use croft_core::{
    AllocationCandidate, AllocationId, CropId, FieldId, Objective, PlanningInstance,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Reference to a candidate: either an index into the shared pool or an
/// owned synthetic candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateHandle {
    Pool(usize),
    Owned(Arc<AllocationCandidate>),
}

/// One committed slot in a working solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub handle: CandidateHandle,
    pub id: AllocationId,
    /// Locked placements are mandatory: operators and destroy steps must
    /// not remove them (used by the adjuster for untouched allocations).
    pub locked: bool,
}

/// A candidate plan under construction or search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionState {
    pub placements: Vec<Placement>,
}

impl SolutionState {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Copy with one more placement (fresh allocation ID).
    pub fn with(&self, handle: CandidateHandle, locked: bool) -> SolutionState {
        let mut next = self.clone();
        next.placements.push(Placement {
            handle,
            id: AllocationId::mint(),
            locked,
        });
        next
    }

    /// Copy without the placement at `index`.
    pub fn without(&self, index: usize) -> SolutionState {
        let mut next = self.clone();
        next.placements.remove(index);
        next
    }

    pub fn unlocked_indices(&self) -> Vec<usize> {
        self.placements
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.locked)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Per-placement scores, parallel to `SolutionState::placements`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredAllocation {
    pub interaction_impact: f64,
    pub cost: f64,
    /// Revenue after impact scaling and cap trimming; `None` when the
    /// crop has no revenue rate.
    pub revenue: Option<f64>,
    pub profit: f64,
}

/// Full evaluation of a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub allocations: Vec<ScoredAllocation>,
    pub total_profit: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
}

impl Evaluation {
    pub fn score(&self, objective: Objective) -> f64 {
        match objective {
            Objective::MaximizeProfit => self.total_profit,
            Objective::MinimizeCost => -self.total_cost,
            Objective::MaximizeRevenue => self.total_revenue,
        }
    }
}

/// Shared, immutable context for one optimization run.
pub struct PlanContext<'a> {
    pub instance: &'a PlanningInstance,
    pub pool: &'a CandidatePool,
    pub rules: RuleIndex,
    pub objective: Objective,
}

impl<'a> PlanContext<'a> {
    pub fn new(
        instance: &'a PlanningInstance,
        pool: &'a CandidatePool,
        objective: Objective,
    ) -> Self {
        PlanContext {
            instance,
            pool,
            rules: RuleIndex::build(instance.rules()),
            objective,
        }
    }

    pub fn candidate<'s>(&'s self, handle: &'s CandidateHandle) -> &'s AllocationCandidate {
        match handle {
            CandidateHandle::Pool(index) => self.pool.get(*index),
            CandidateHandle::Owned(candidate) => candidate,
        }
    }

    pub fn fallow_days(&self, field: &FieldId) -> i64 {
        self.instance
            .field(field)
            .map_or(0, |f| f.fallow_period_days)
    }

    fn crop_groups(&self, crop: &CropId) -> &[String] {
        self.instance
            .profile(crop)
            .map_or(&[], |p| p.crop.groups.as_slice())
    }

    fn field_groups(&self, field: &FieldId) -> &[String] {
        self.instance
            .field(field)
            .map_or(&[], |f| f.groups.as_slice())
    }

    /// Whether `candidate` collides (fallow included) with any placement
    /// on its field, excluding placement `exclude`.
    pub fn conflicts_on_field(
        &self,
        state: &SolutionState,
        candidate: &AllocationCandidate,
        exclude: Option<usize>,
    ) -> bool {
        let fallow = self.fallow_days(&candidate.field_id);
        state.placements.iter().enumerate().any(|(i, p)| {
            if exclude == Some(i) {
                return false;
            }
            let other = self.candidate(&p.handle);
            other.field_id == candidate.field_id
                && candidate.conflicts_with(other.start_date, other.completion_date, fallow)
        })
    }

    /// Window containment, field capacity and overlap feasibility.
    pub fn can_insert(&self, state: &SolutionState, candidate: &AllocationCandidate) -> bool {
        let window = self.instance.window();
        if !window.contains(candidate.start_date) || !window.contains(candidate.completion_date) {
            return false;
        }
        match self.instance.field(&candidate.field_id) {
            Some(field) => {
                if candidate.area_used > field.area_m2 + 1e-9 {
                    return false;
                }
            }
            None => return false,
        }
        !self.conflicts_on_field(state, candidate, None)
    }

    /// Impact the candidate would carry if inserted now: field
    /// compatibility times the temporal effect of its would-be
    /// predecessor. (The effect on a successor is captured by the full
    /// evaluation.)
    pub fn insertion_impact(&self, state: &SolutionState, candidate: &AllocationCandidate) -> f64 {
        let mut impact = self.rules.field_impact(
            self.field_groups(&candidate.field_id),
            self.crop_groups(&candidate.crop_id),
        );
        let predecessor = state
            .placements
            .iter()
            .map(|p| self.candidate(&p.handle))
            .filter(|c| {
                c.field_id == candidate.field_id && c.completion_date < candidate.start_date
            })
            .max_by_key(|c| c.completion_date);
        if let Some(prev) = predecessor {
            impact *= self.rules.temporal_impact(
                self.crop_groups(&prev.crop_id),
                self.crop_groups(&candidate.crop_id),
            );
        }
        impact
    }

    /// Evaluate a state: impacts per field timeline, kernel scoring,
    /// cap trimming, totals.
    pub fn evaluate(&self, state: &SolutionState) -> Evaluation {
        let n = state.placements.len();
        let mut scored = vec![
            ScoredAllocation {
                interaction_impact: 1.0,
                cost: 0.0,
                revenue: None,
                profit: 0.0,
            };
            n
        ];

        // Interaction impacts follow each field's timeline.
        let mut by_field: HashMap<&FieldId, Vec<usize>> = HashMap::new();
        for (i, p) in state.placements.iter().enumerate() {
            by_field
                .entry(&self.candidate(&p.handle).field_id)
                .or_default()
                .push(i);
        }
        for (field_id, mut indices) in by_field {
            indices.sort_by_key(|&i| self.candidate(&state.placements[i].handle).start_date);
            let field_groups = self.field_groups(field_id);
            let mut prior_crop: Option<&CropId> = None;
            for &i in &indices {
                let candidate = self.candidate(&state.placements[i].handle);
                let crop_groups = self.crop_groups(&candidate.crop_id);
                let mut impact = self.rules.field_impact(field_groups, crop_groups);
                if let Some(prior) = prior_crop {
                    impact *= self
                        .rules
                        .temporal_impact(self.crop_groups(prior), crop_groups);
                }
                let metrics = candidate.metrics_with_impact(impact);
                scored[i] = ScoredAllocation {
                    interaction_impact: impact,
                    cost: metrics.cost(),
                    revenue: metrics.revenue(),
                    profit: metrics.profit(),
                };
                prior_crop = Some(&candidate.crop_id);
            }
        }

        // Trim per-crop revenue to the cap, decreasing profit first.
        let mut by_crop: HashMap<&CropId, Vec<usize>> = HashMap::new();
        for (i, p) in state.placements.iter().enumerate() {
            let candidate = self.candidate(&p.handle);
            if candidate.revenue_cap.is_some() {
                by_crop.entry(&candidate.crop_id).or_default();
            }
            if let Some(indices) = by_crop.get_mut(&candidate.crop_id) {
                indices.push(i);
            }
        }
        for (_, mut indices) in by_crop {
            let cap = indices
                .iter()
                .find_map(|&i| self.candidate(&state.placements[i].handle).revenue_cap);
            let Some(cap) = cap else { continue };
            indices.sort_by(|&a, &b| {
                scored[b]
                    .profit
                    .partial_cmp(&scored[a].profit)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| self.placement_key(state, a).cmp(&self.placement_key(state, b)))
            });
            let mut remaining = cap;
            for &i in &indices {
                if let Some(revenue) = scored[i].revenue {
                    let granted = revenue.min(remaining).max(0.0);
                    scored[i].revenue = Some(granted);
                    scored[i].profit = granted - scored[i].cost;
                    remaining -= granted;
                }
            }
        }

        let total_cost = scored.iter().map(|s| s.cost).sum();
        let total_revenue = scored.iter().filter_map(|s| s.revenue).sum();
        let total_profit = scored.iter().map(|s| s.profit).sum();
        Evaluation {
            allocations: scored,
            total_profit,
            total_cost,
            total_revenue,
        }
    }

    /// Capped revenue currently attributed to one crop.
    pub fn crop_revenue(
        &self,
        state: &SolutionState,
        evaluation: &Evaluation,
        crop: &CropId,
    ) -> f64 {
        state
            .placements
            .iter()
            .zip(&evaluation.allocations)
            .filter(|(p, _)| &self.candidate(&p.handle).crop_id == crop)
            .filter_map(|(_, s)| s.revenue)
            .sum()
    }

    /// Stable sort key for one placement (independent of allocation IDs,
    /// which are random and must not influence decisions).
    fn placement_key(
        &self,
        state: &SolutionState,
        index: usize,
    ) -> (FieldId, CropId, NaiveDate, u32) {
        let c = self.candidate(&state.placements[index].handle);
        (
            c.field_id.clone(),
            c.crop_id.clone(),
            c.start_date,
            c.quantity,
        )
    }

    /// Deterministic state key for tie-breaking: sorted candidate keys.
    pub fn state_key(&self, state: &SolutionState) -> Vec<(FieldId, CropId, NaiveDate, u32)> {
        let mut keys: Vec<_> = (0..state.placements.len())
            .map(|i| self.placement_key(state, i))
            .collect();
        keys.sort();
        keys
    }

    /// Strict "a beats b": higher objective score, then fewer
    /// allocations, then lexicographically smaller state key.
    pub fn better_than(
        &self,
        a: (&Evaluation, &SolutionState),
        b: (&Evaluation, &SolutionState),
    ) -> bool {
        let (ea, sa) = a;
        let (eb, sb) = b;
        let score_a = ea.score(self.objective);
        let score_b = eb.score(self.objective);
        if score_a != score_b {
            return score_a > score_b;
        }
        if sa.len() != sb.len() {
            return sa.len() < sb.len();
        }
        self.state_key(sa) < self.state_key(sb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::generate_candidates;
    use crate::test_utils::{instance_with, rule, simple_field, uniform_profile};
    use croft_core::{AlgorithmConfig, RuleType};

    fn setup() -> (PlanningInstance, AlgorithmConfig) {
        let mut wheat = uniform_profile("wheat", 150.0, Some(20.0));
        wheat.crop.groups = vec!["Poaceae".into()];
        let mut bean = uniform_profile("bean", 150.0, Some(25.0));
        bean.crop.groups = vec!["Fabaceae".into()];
        let instance = instance_with(
            vec![simple_field("a", 100.0, 1.0, 7)],
            vec![wheat, bean],
            vec![rule(
                "r1",
                RuleType::BeneficialRotation,
                "Fabaceae",
                "Poaceae",
                1.5,
            )],
            "2023-04-01",
            "2023-08-31",
            25.0,
        );
        // Deep pool so tests can look up arbitrary start dates.
        let config = AlgorithmConfig {
            top_period_candidates: 200,
            ..AlgorithmConfig::default()
        };
        (instance, config)
    }

    #[test]
    fn test_temporal_impact_applied_to_successor() {
        let (instance, config) = setup();
        let pool = generate_candidates(&instance, &config).unwrap();
        let ctx = PlanContext::new(&instance, &pool, Objective::MaximizeProfit);

        let field = FieldId::new("a");
        let bean_first = pool
            .at(&field, &CropId::new("bean"), "2023-04-01".parse().unwrap(), Some(100))
            .unwrap();
        // Bean completes 04-10; 7-day fallow permits a start on 04-17.
        let wheat_after = pool
            .best_near(&field, &CropId::new("wheat"), "2023-04-25".parse().unwrap(), 7)
            .unwrap();

        let state = SolutionState::default()
            .with(CandidateHandle::Pool(bean_first), false)
            .with(CandidateHandle::Pool(wheat_after), false);
        let eval = ctx.evaluate(&state);

        assert_eq!(eval.allocations[0].interaction_impact, 1.0);
        assert_eq!(eval.allocations[1].interaction_impact, 1.5);
        let wheat = pool.get(wheat_after);
        let expected = wheat.metrics_with_impact(1.5).profit();
        assert!((eval.allocations[1].profit - expected).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_and_fallow_feasibility() {
        let (instance, config) = setup();
        let pool = generate_candidates(&instance, &config).unwrap();
        let ctx = PlanContext::new(&instance, &pool, Objective::MaximizeProfit);

        let field = FieldId::new("a");
        let crop = CropId::new("wheat");
        let first = pool
            .at(&field, &crop, "2023-04-01".parse().unwrap(), Some(100))
            .unwrap();
        let state = SolutionState::default().with(CandidateHandle::Pool(first), false);

        // Completion 04-10 + 7 fallow: 04-16 still conflicts, 04-17 fits.
        let too_soon = pool
            .at(&field, &crop, "2023-04-16".parse().unwrap(), None)
            .unwrap();
        assert!(!ctx.can_insert(&state, pool.get(too_soon)));
        let fits = pool
            .at(&field, &crop, "2023-04-17".parse().unwrap(), None)
            .unwrap();
        assert!(ctx.can_insert(&state, pool.get(fits)));
    }

    #[test]
    fn test_cap_trimming_in_evaluation() {
        let mut gold = uniform_profile("gold", 150.0, Some(50.0));
        gold.crop.revenue_cap = Some(6_000.0);
        let instance = instance_with(
            vec![
                simple_field("a", 100.0, 1.0, 7),
                simple_field("b", 100.0, 1.0, 7),
            ],
            vec![gold],
            vec![],
            "2023-04-01",
            "2023-06-30",
            25.0,
        );
        let config = AlgorithmConfig::default();
        let pool = generate_candidates(&instance, &config).unwrap();
        let ctx = PlanContext::new(&instance, &pool, Objective::MaximizeProfit);

        let start: chrono::NaiveDate = "2023-04-01".parse().unwrap();
        let crop = CropId::new("gold");
        let a = pool.at(&FieldId::new("a"), &crop, start, Some(100)).unwrap();
        let b = pool.at(&FieldId::new("b"), &crop, start, Some(100)).unwrap();
        let state = SolutionState::default()
            .with(CandidateHandle::Pool(a), false)
            .with(CandidateHandle::Pool(b), false);

        let eval = ctx.evaluate(&state);
        // Each allocation alone earns 5000; the cap leaves 1000 for the
        // second.
        assert!((eval.total_revenue - 6_000.0).abs() < 1e-9);
        assert!((ctx.crop_revenue(&state, &eval, &crop) - 6_000.0).abs() < 1e-9);
        let revenues: Vec<f64> = eval.allocations.iter().map(|s| s.revenue.unwrap()).collect();
        assert!(revenues.contains(&5_000.0));
        assert!(revenues.contains(&1_000.0));
    }

    #[test]
    fn test_better_than_tie_breaks() {
        let (instance, config) = setup();
        let pool = generate_candidates(&instance, &config).unwrap();
        let ctx = PlanContext::new(&instance, &pool, Objective::MaximizeProfit);

        let state = SolutionState::default();
        let eval = ctx.evaluate(&state);
        // A state never strictly beats itself.
        assert!(!ctx.better_than((&eval, &state), (&eval, &state)));
    }
}
