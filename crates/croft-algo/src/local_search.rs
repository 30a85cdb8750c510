//! Hill climbing over the neighborhood operators.
//!
//! Each iteration tries the operators in descending configured weight;
//! the first operator whose best neighbor strictly beats the incumbent
//! is accepted and the pass restarts. A full pass with no improvement,
//! the iteration cap, or the deadline ends the climb. Ties are broken
//! deterministically (score, then allocation count, then state key), so
//! a fixed seed reproduces the same trajectory.

use crate::deadline::Deadline;
use crate::operators::{neighbors, OperatorKind};
use crate::solution::{Evaluation, PlanContext, SolutionState};
use croft_core::AlgorithmConfig;
use rand::rngs::StdRng;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct HillClimbOutcome {
    pub state: SolutionState,
    pub iterations: u32,
    pub timed_out: bool,
}

/// Improve `initial` until stagnation, the iteration cap, or the
/// deadline.
pub fn hill_climb(
    ctx: &PlanContext<'_>,
    initial: SolutionState,
    config: &AlgorithmConfig,
    rng: &mut StdRng,
    deadline: &Deadline,
) -> HillClimbOutcome {
    // Operators in descending configured weight; weight zero disables.
    let mut order: Vec<OperatorKind> = OperatorKind::ALL
        .into_iter()
        .filter(|kind| operator_weight(config, *kind) > 0.0)
        .collect();
    order.sort_by(|a, b| {
        operator_weight(config, *b)
            .partial_cmp(&operator_weight(config, *a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut incumbent = initial;
    let mut incumbent_eval = ctx.evaluate(&incumbent);
    let mut iterations = 0;
    let mut timed_out = false;

    'outer: while iterations < config.local_search_max_iterations {
        if deadline.expired() {
            timed_out = true;
            break;
        }
        iterations += 1;

        for kind in &order {
            let generated = neighbors(*kind, ctx, &incumbent, config, rng);

            // Neighbor evaluation is pure, so it fans out across the
            // worker pool; selection below is order-deterministic either
            // way.
            #[cfg(feature = "parallel")]
            let evaluated: Vec<Evaluation> =
                generated.par_iter().map(|n| ctx.evaluate(n)).collect();
            #[cfg(not(feature = "parallel"))]
            let evaluated: Vec<Evaluation> =
                generated.iter().map(|n| ctx.evaluate(n)).collect();

            let mut best: Option<(Evaluation, SolutionState)> = None;
            for (eval, neighbor) in evaluated.into_iter().zip(generated) {
                let beats_best = match &best {
                    Some((best_eval, best_state)) => {
                        ctx.better_than((&eval, &neighbor), (best_eval, best_state))
                    }
                    None => true,
                };
                if beats_best {
                    best = Some((eval, neighbor));
                }
            }
            if let Some((eval, state)) = best {
                if ctx.better_than((&eval, &state), (&incumbent_eval, &incumbent)) {
                    debug!(
                        operator = kind.name(),
                        score = eval.score(ctx.objective),
                        "hill climb accepted"
                    );
                    incumbent = state;
                    incumbent_eval = eval;
                    continue 'outer;
                }
            }
        }
        // Full pass without improvement.
        break;
    }

    debug!(
        iterations,
        score = incumbent_eval.score(ctx.objective),
        "hill climb finished"
    );
    HillClimbOutcome {
        state: incumbent,
        iterations,
        timed_out,
    }
}

pub(crate) fn operator_weight(config: &AlgorithmConfig, kind: OperatorKind) -> f64 {
    config
        .operator_weights
        .get(kind.name())
        .copied()
        .unwrap_or(1.0)
}
