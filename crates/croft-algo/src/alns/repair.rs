//! Repair operators: rebuild a partial solution.
//!
//! The insertion pool is the removed handles plus every pool candidate;
//! an insertion must keep the field timeline feasible, keep the crop's
//! capped revenue within its cap, and carry positive profit under its
//! recomputed interaction impact (the greedy constructor's accept rule).

use crate::solution::{CandidateHandle, PlanContext, SolutionState};
use croft_core::AllocationCandidate;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairKind {
    GreedyInsert,
    RegretInsert,
}

impl RepairKind {
    pub const ALL: [RepairKind; 2] = [RepairKind::GreedyInsert, RepairKind::RegretInsert];

    pub fn name(self) -> &'static str {
        match self {
            RepairKind::GreedyInsert => "greedy_insert",
            RepairKind::RegretInsert => "regret_insert",
        }
    }
}

pub fn apply(
    kind: RepairKind,
    ctx: &PlanContext<'_>,
    state: SolutionState,
    removed: &[CandidateHandle],
    _rng: &mut StdRng,
) -> SolutionState {
    match kind {
        RepairKind::GreedyInsert => greedy_insert(ctx, state, removed),
        RepairKind::RegretInsert => regret_insert(ctx, state, removed),
    }
}

/// All insertable handles: the removed ones plus the whole pool.
fn insertion_pool(ctx: &PlanContext<'_>, removed: &[CandidateHandle]) -> Vec<CandidateHandle> {
    let mut handles: Vec<CandidateHandle> = removed.to_vec();
    handles.extend((0..ctx.pool.len()).map(CandidateHandle::Pool));
    handles
}

fn insertion_profit(
    ctx: &PlanContext<'_>,
    state: &SolutionState,
    candidate: &AllocationCandidate,
) -> Option<f64> {
    if !ctx.can_insert(state, candidate) {
        return None;
    }
    let impact = ctx.insertion_impact(state, candidate);
    let metrics = candidate.metrics_with_impact(impact);
    let profit = metrics.profit();
    if profit <= 0.0 {
        return None;
    }
    if let Some(cap) = candidate.revenue_cap {
        let evaluation = ctx.evaluate(state);
        let used = ctx.crop_revenue(state, &evaluation, &candidate.crop_id);
        if used + metrics.revenue().unwrap_or(0.0) > cap + 1e-6 {
            return None;
        }
    }
    Some(profit)
}

/// Reinsert by descending profit rate, skipping infeasible candidates.
fn greedy_insert(
    ctx: &PlanContext<'_>,
    state: SolutionState,
    removed: &[CandidateHandle],
) -> SolutionState {
    let mut handles = insertion_pool(ctx, removed);
    handles.sort_by(|a, b| {
        let ma = ctx.candidate(a).metrics();
        let mb = ctx.candidate(b).metrics();
        mb.profit_rate()
            .partial_cmp(&ma.profit_rate())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| candidate_key(ctx.candidate(a)).cmp(&candidate_key(ctx.candidate(b))))
    });

    let mut current = state;
    for handle in handles {
        let candidate = ctx.candidate(&handle).clone();
        if insertion_profit(ctx, &current, &candidate).is_some() {
            current = current.with(handle, false);
        }
    }
    current
}

/// Regret insertion: at each step, each removed crop request measures the
/// gap between its best and second-best feasible placement; the request
/// with the largest regret commits its best placement first.
fn regret_insert(
    ctx: &PlanContext<'_>,
    state: SolutionState,
    removed: &[CandidateHandle],
) -> SolutionState {
    let mut current = state;
    let mut pending: Vec<CandidateHandle> = removed.to_vec();

    while !pending.is_empty() {
        let mut best_request: Option<(usize, CandidateHandle, f64)> = None;

        for (request_index, request) in pending.iter().enumerate() {
            let crop_id = &ctx.candidate(request).crop_id;

            // Options for this request: its own handle plus any pool
            // candidate growing the same crop.
            let mut options: Vec<(CandidateHandle, f64)> = Vec::new();
            if let Some(profit) = insertion_profit(ctx, &current, ctx.candidate(request)) {
                options.push((request.clone(), profit));
            }
            for (index, candidate) in ctx.pool.iter() {
                if &candidate.crop_id != crop_id {
                    continue;
                }
                if let Some(profit) = insertion_profit(ctx, &current, candidate) {
                    options.push((CandidateHandle::Pool(index), profit));
                }
            }
            options.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        candidate_key(ctx.candidate(&a.0)).cmp(&candidate_key(ctx.candidate(&b.0)))
                    })
            });

            let Some((best_handle, best_profit)) = options.first().cloned() else {
                continue;
            };
            let second_profit = options.get(1).map_or(0.0, |o| o.1);
            let regret = best_profit - second_profit;

            let beats = match &best_request {
                Some((_, _, current_regret)) => regret > *current_regret,
                None => true,
            };
            if beats {
                best_request = Some((request_index, best_handle, regret));
            }
        }

        match best_request {
            Some((request_index, handle, _)) => {
                current = current.with(handle, false);
                pending.remove(request_index);
            }
            // No pending request is insertable any more.
            None => break,
        }
    }
    current
}

fn candidate_key(
    candidate: &AllocationCandidate,
) -> (
    croft_core::FieldId,
    croft_core::CropId,
    chrono::NaiveDate,
    u32,
) {
    (
        candidate.field_id.clone(),
        candidate.crop_id.clone(),
        candidate.start_date,
        candidate.quantity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alns::destroy::{self, DestroyKind};
    use crate::candidates::generate_candidates;
    use crate::deadline::Deadline;
    use crate::greedy::construct_greedy;
    use crate::test_utils::{instance_with, simple_field, uniform_profile};
    use croft_core::{AlgorithmConfig, Objective};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_repairs_recover_destroyed_profit() {
        let instance = instance_with(
            vec![
                simple_field("a", 100.0, 1.0, 7),
                simple_field("b", 80.0, 1.0, 7),
            ],
            vec![uniform_profile("wheat", 150.0, Some(20.0))],
            vec![],
            "2023-04-01",
            "2023-07-31",
            25.0,
        );
        let config = AlgorithmConfig {
            top_period_candidates: 50,
            ..AlgorithmConfig::default()
        };
        let pool = generate_candidates(&instance, &config).unwrap();
        let ctx = PlanContext::new(&instance, &pool, Objective::MaximizeProfit);
        let start = construct_greedy(&ctx, &SolutionState::default(), &Deadline::unbounded());
        let start_profit = ctx.evaluate(&start.state).total_profit;

        let mut rng = StdRng::seed_from_u64(9);
        for repair_kind in RepairKind::ALL {
            let (partial, removed) =
                destroy::apply(DestroyKind::Random, &ctx, &start.state, &mut rng, 0.5);
            let repaired = apply(repair_kind, &ctx, partial, &removed, &mut rng);
            let profit = ctx.evaluate(&repaired).total_profit;
            // Constant weather and a symmetric pool: reinsertion can
            // always rebuild an equally good schedule.
            assert!(
                profit >= start_profit - 1e-6,
                "{:?} lost profit: {} < {}",
                repair_kind,
                profit,
                start_profit
            );
        }
    }
}
