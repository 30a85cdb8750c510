//! Per-field weighted-interval scheduling.
//!
//! Each field is solved independently with the classical DP: candidates
//! sorted by completion date, `p(i)` found by binary search, and
//! `opt(i) = max(opt(i-1), profit(i) + opt(p(i)))`. The per-field
//! selection is optimal on static candidate profits (field-compatibility
//! impact included); the union over fields then goes through a
//! revenue-cap reconciliation pass, which is where the result becomes
//! heuristic when caps bind.

use crate::deadline::Deadline;
use crate::solution::{CandidateHandle, PlanContext, SolutionState};
use tracing::debug;

/// Solver result: the state plus the deadline soft signal.
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub state: SolutionState,
    pub timed_out: bool,
}

/// Solve every field with the weighted-interval DP, starting from `base`
/// (whose placements block their fields and are carried into the result).
pub fn solve_dp(ctx: &PlanContext<'_>, base: &SolutionState, deadline: &Deadline) -> SolverOutcome {
    let mut state = base.clone();
    let mut timed_out = false;

    for field in ctx.instance.fields() {
        if deadline.expired() {
            timed_out = true;
            break;
        }

        let fallow = field.fallow_period_days;
        let field_groups = &field.groups;

        // Static profit per candidate; blocked candidates (colliding with
        // base placements) are excluded up front.
        struct Item {
            index: usize,
            start: chrono::NaiveDate,
            completion: chrono::NaiveDate,
            profit: f64,
        }
        let mut items: Vec<Item> = ctx
            .pool
            .for_field(&field.id)
            .iter()
            .copied()
            .filter_map(|index| {
                let candidate = ctx.pool.get(index);
                if ctx.conflicts_on_field(base, candidate, None) {
                    return None;
                }
                let impact = ctx.rules.field_impact(
                    field_groups,
                    ctx.instance
                        .profile(&candidate.crop_id)
                        .map_or(&[], |p| p.crop.groups.as_slice()),
                );
                Some(Item {
                    index,
                    start: candidate.start_date,
                    completion: candidate.completion_date,
                    profit: candidate.metrics_with_impact(impact).profit(),
                })
            })
            .collect();
        if items.is_empty() {
            continue;
        }
        items.sort_by(|a, b| {
            a.completion
                .cmp(&b.completion)
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.index.cmp(&b.index))
        });

        // p(i): rightmost j whose completion plus the fallow rest clears
        // item i's start. Compatibility is completion + rest <= start,
        // with a one-day floor on the rest.
        let completions: Vec<chrono::NaiveDate> = items.iter().map(|i| i.completion).collect();
        let p: Vec<Option<usize>> = items
            .iter()
            .map(|item| {
                let latest_ok = item.start - chrono::Duration::days(fallow.max(1));
                let count = completions.partition_point(|&c| c <= latest_ok);
                count.checked_sub(1)
            })
            .collect();

        // opt[i] = best profit over items[0..i].
        let n = items.len();
        let mut opt = vec![0.0f64; n + 1];
        for i in 0..n {
            let take = items[i].profit + p[i].map_or(0.0, |j| opt[j + 1]);
            opt[i + 1] = opt[i].max(take);
        }

        // Backtrack the chosen subset.
        let mut chosen = Vec::new();
        let mut i = n;
        while i > 0 {
            let take = items[i - 1].profit + p[i - 1].map_or(0.0, |j| opt[j + 1]);
            if take > opt[i - 1] {
                chosen.push(items[i - 1].index);
                i = p[i - 1].map_or(0, |j| j + 1);
            } else {
                i -= 1;
            }
        }
        chosen.reverse();

        debug!(
            field = %field.id,
            candidates = n,
            selected = chosen.len(),
            best = opt[n],
            "field schedule solved"
        );
        for index in chosen {
            state = state.with(CandidateHandle::Pool(index), false);
        }
    }

    SolverOutcome {
        state: reconcile_caps(ctx, state),
        timed_out,
    }
}

/// Revenue-cap reconciliation: evaluation already trims per-crop revenue
/// to the cap in decreasing-profit order; here allocations whose trimmed
/// profit goes negative (cap exhausted, or temporal penalties) are
/// dropped, worst first, until the state is stable. Locked placements
/// are never dropped.
pub fn reconcile_caps(ctx: &PlanContext<'_>, mut state: SolutionState) -> SolutionState {
    loop {
        let evaluation = ctx.evaluate(&state);
        let worst = state
            .placements
            .iter()
            .enumerate()
            .filter(|(i, p)| !p.locked && evaluation.allocations[*i].profit < 0.0)
            .min_by(|(a, _), (b, _)| {
                evaluation.allocations[*a]
                    .profit
                    .partial_cmp(&evaluation.allocations[*b].profit)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i);
        match worst {
            Some(index) => state = state.without(index),
            None => return state,
        }
    }
}
