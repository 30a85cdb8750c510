//! Adaptive Large Neighborhood Search with Simulated-Annealing
//! acceptance.
//!
//! Each iteration draws one destroy and one repair operator by roulette
//! over adaptive weights, applies them to the incumbent, and accepts the
//! proposal when the score improves or with probability `exp(delta / t)`
//! otherwise. Operator weights decay every iteration, earn a smoothed
//! reward share on success (new global best > improvement > plain
//! acceptance), and are periodically softened back toward uniform to
//! keep diversification alive. The global best is tracked separately
//! from the incumbent and returned.

pub mod destroy;
pub mod repair;

use crate::deadline::Deadline;
use crate::solution::{PlanContext, SolutionState};
use croft_core::AlgorithmConfig;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

pub use destroy::DestroyKind;
pub use repair::RepairKind;

const REWARD_NEW_BEST: f64 = 10.0;
const REWARD_IMPROVED: f64 = 5.0;
const REWARD_ACCEPTED: f64 = 1.0;
/// Iterations between softening passes back toward uniform weights.
const SOFTEN_PERIOD: u32 = 100;
/// Per-iteration weight decay factor.
const WEIGHT_DECAY: f64 = 0.99;
/// Weights never fall below this floor so roulette stays well-defined.
const WEIGHT_FLOOR: f64 = 0.01;

/// Roulette-selected operator weights with decay, reward smoothing and
/// periodic softening.
#[derive(Debug, Clone)]
pub struct AdaptiveWeights {
    names: Vec<&'static str>,
    weights: Vec<f64>,
    decay: f64,
}

impl AdaptiveWeights {
    fn new(names: Vec<&'static str>, config: &AlgorithmConfig) -> Self {
        let weights = names
            .iter()
            .map(|name| {
                config
                    .operator_weights
                    .get(*name)
                    .copied()
                    .unwrap_or(1.0)
                    .max(WEIGHT_FLOOR)
            })
            .collect();
        AdaptiveWeights {
            names,
            weights,
            decay: WEIGHT_DECAY,
        }
    }

    fn select(&self, rng: &mut StdRng) -> usize {
        let total: f64 = self.weights.iter().sum();
        let mut ticket = rng.gen::<f64>() * total;
        for (i, weight) in self.weights.iter().enumerate() {
            ticket -= weight;
            if ticket <= 0.0 {
                return i;
            }
        }
        self.weights.len() - 1
    }

    /// Decay every weight; the chosen operator receives a smoothed share
    /// of its reward.
    fn update(&mut self, chosen: usize, reward: f64) {
        for weight in &mut self.weights {
            *weight = (*weight * self.decay).max(WEIGHT_FLOOR);
        }
        self.weights[chosen] += (1.0 - self.decay) * reward;
    }

    /// Pull every weight halfway back to uniform.
    fn soften(&mut self) {
        for weight in &mut self.weights {
            *weight = 0.5 * (*weight + 1.0);
        }
    }

    pub fn snapshot(&self) -> Vec<(String, f64)> {
        self.names
            .iter()
            .zip(&self.weights)
            .map(|(name, weight)| ((*name).to_string(), *weight))
            .collect()
    }
}

/// Counters and final weights for observability.
#[derive(Debug, Clone, Default)]
pub struct AlnsStats {
    pub iterations: u32,
    pub accepted: u32,
    pub improved: u32,
    pub new_best: u32,
    pub rejected: u32,
    /// Iterations whose repair produced a state identical to the input.
    pub noops: u32,
    pub destroy_weights: Vec<(String, f64)>,
    pub repair_weights: Vec<(String, f64)>,
}

#[derive(Debug, Clone)]
pub struct AlnsOutcome {
    pub state: SolutionState,
    pub stats: AlnsStats,
    pub timed_out: bool,
}

/// Run ALNS from `initial`, returning the global best observed.
pub fn run_alns(
    ctx: &PlanContext<'_>,
    initial: SolutionState,
    config: &AlgorithmConfig,
    rng: &mut StdRng,
    deadline: &Deadline,
) -> AlnsOutcome {
    let mut destroy_weights =
        AdaptiveWeights::new(DestroyKind::ALL.iter().map(|k| k.name()).collect(), config);
    let mut repair_weights =
        AdaptiveWeights::new(RepairKind::ALL.iter().map(|k| k.name()).collect(), config);

    let mut current = initial.clone();
    let mut current_eval = ctx.evaluate(&current);
    let mut best = initial;
    let mut best_eval = current_eval.clone();

    let mut temperature = config.sa_initial_temperature;
    let mut stats = AlnsStats::default();
    let mut timed_out = false;

    for iteration in 0..config.alns_iterations {
        if deadline.expired() {
            timed_out = true;
            break;
        }
        stats.iterations = iteration + 1;

        let destroy_index = destroy_weights.select(rng);
        let repair_index = repair_weights.select(rng);
        let destroy_kind = DestroyKind::ALL[destroy_index];
        let repair_kind = RepairKind::ALL[repair_index];

        let (partial, removed) =
            destroy::apply(destroy_kind, ctx, &current, rng, config.alns_removal_rate);
        let proposal = repair::apply(repair_kind, ctx, partial, &removed, rng);

        let mut reward = 0.0;
        // Allocation IDs are reminted on reinsertion, so no-op detection
        // compares candidate keys, not placements.
        if ctx.state_key(&proposal) == ctx.state_key(&current) {
            // No feasible repair: the iteration counts, the operators
            // earn nothing.
            stats.noops += 1;
        } else {
            let proposal_eval = ctx.evaluate(&proposal);
            let delta =
                proposal_eval.score(ctx.objective) - current_eval.score(ctx.objective);
            let accept = delta > 0.0 || rng.gen::<f64>() < (delta / temperature).exp();

            if accept {
                if proposal_eval.score(ctx.objective) > best_eval.score(ctx.objective) {
                    best = proposal.clone();
                    best_eval = proposal_eval.clone();
                    reward = REWARD_NEW_BEST;
                    stats.new_best += 1;
                    debug!(
                        iteration,
                        score = best_eval.score(ctx.objective),
                        destroy = destroy_kind.name(),
                        repair = repair_kind.name(),
                        "new global best"
                    );
                } else if delta > 0.0 {
                    reward = REWARD_IMPROVED;
                    stats.improved += 1;
                } else {
                    reward = REWARD_ACCEPTED;
                }
                current = proposal;
                current_eval = proposal_eval;
                stats.accepted += 1;
            } else {
                stats.rejected += 1;
            }
        }

        destroy_weights.update(destroy_index, reward);
        repair_weights.update(repair_index, reward);
        if (iteration + 1) % SOFTEN_PERIOD == 0 {
            destroy_weights.soften();
            repair_weights.soften();
        }
        temperature *= config.sa_cooling_rate;
    }

    stats.destroy_weights = destroy_weights.snapshot();
    stats.repair_weights = repair_weights.snapshot();
    debug!(
        iterations = stats.iterations,
        accepted = stats.accepted,
        new_best = stats.new_best,
        "ALNS finished"
    );
    AlnsOutcome {
        state: best,
        stats,
        timed_out,
    }
}
