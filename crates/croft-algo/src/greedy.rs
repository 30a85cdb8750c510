//! Greedy construction: highest profit rate first, insert while feasible.
//!
//! Candidates are ordered by profit rate (ties: absolute profit, then
//! earlier start, then candidate key). A candidate is accepted when its
//! field timeline stays feasible, the crop's cumulative revenue stays
//! within its cap, and its profit under the recomputed interaction
//! impact stays positive. The result seeds local search and ALNS.

use crate::deadline::Deadline;
use crate::dp::SolverOutcome;
use crate::solution::{CandidateHandle, PlanContext, SolutionState};
use tracing::debug;

/// Construct a feasible starting solution on top of `base`.
pub fn construct_greedy(
    ctx: &PlanContext<'_>,
    base: &SolutionState,
    deadline: &Deadline,
) -> SolverOutcome {
    let mut order: Vec<usize> = (0..ctx.pool.len()).collect();
    order.sort_by(|&a, &b| {
        let ca = ctx.pool.get(a);
        let cb = ctx.pool.get(b);
        let ma = ca.metrics();
        let mb = cb.metrics();
        mb.profit_rate()
            .partial_cmp(&ma.profit_rate())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                mb.profit()
                    .partial_cmp(&ma.profit())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| ca.start_date.cmp(&cb.start_date))
            .then_with(|| {
                (&ca.field_id, &ca.crop_id, ca.quantity).cmp(&(
                    &cb.field_id,
                    &cb.crop_id,
                    cb.quantity,
                ))
            })
    });

    let mut state = base.clone();
    let mut timed_out = false;
    let mut accepted = 0usize;

    for index in order {
        if deadline.expired() {
            timed_out = true;
            break;
        }
        let candidate = ctx.pool.get(index);
        if !ctx.can_insert(&state, candidate) {
            continue;
        }

        let impact = ctx.insertion_impact(&state, candidate);
        let metrics = candidate.metrics_with_impact(impact);
        if metrics.profit() <= 0.0 {
            continue;
        }

        if let Some(cap) = candidate.revenue_cap {
            let evaluation = ctx.evaluate(&state);
            let used = ctx.crop_revenue(&state, &evaluation, &candidate.crop_id);
            let addition = metrics.revenue().unwrap_or(0.0);
            if used + addition > cap + 1e-6 {
                continue;
            }
        }

        state = state.with(CandidateHandle::Pool(index), false);
        accepted += 1;
    }

    debug!(accepted, total = state.len(), "greedy construction done");
    SolverOutcome { state, timed_out }
}
