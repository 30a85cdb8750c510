//! Destroy operators: remove a slice of the current solution.
//!
//! Locked placements are never removed. Every operator returns the
//! handles it removed so repair can offer them back.

use crate::solution::{CandidateHandle, PlanContext, SolutionState};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestroyKind {
    Random,
    Worst,
    Related,
    Field,
    TimeSlice,
}

impl DestroyKind {
    pub const ALL: [DestroyKind; 5] = [
        DestroyKind::Random,
        DestroyKind::Worst,
        DestroyKind::Related,
        DestroyKind::Field,
        DestroyKind::TimeSlice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DestroyKind::Random => "random_removal",
            DestroyKind::Worst => "worst_removal",
            DestroyKind::Related => "related_removal",
            DestroyKind::Field => "field_removal",
            DestroyKind::TimeSlice => "time_slice_removal",
        }
    }
}

/// Apply the operator; returns the shrunken state and the removed
/// handles.
pub fn apply(
    kind: DestroyKind,
    ctx: &PlanContext<'_>,
    state: &SolutionState,
    rng: &mut StdRng,
    removal_rate: f64,
) -> (SolutionState, Vec<CandidateHandle>) {
    let unlocked = state.unlocked_indices();
    if unlocked.is_empty() {
        return (state.clone(), vec![]);
    }
    let count = ((unlocked.len() as f64 * removal_rate).round() as usize).max(1);

    let victims: Vec<usize> = match kind {
        DestroyKind::Random => {
            let mut pool = unlocked;
            pool.shuffle(rng);
            pool.truncate(count);
            pool
        }
        DestroyKind::Worst => {
            let evaluation = ctx.evaluate(state);
            let mut pool = unlocked;
            pool.sort_by(|&a, &b| {
                let ra = profit_rate(ctx, state, &evaluation, a);
                let rb = profit_rate(ctx, state, &evaluation, b);
                ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
            });
            pool.truncate(count);
            pool
        }
        DestroyKind::Related => {
            let seed = *unlocked.choose(rng).expect("unlocked is non-empty");
            let seed_candidate = ctx.candidate(&state.placements[seed].handle).clone();
            let mut pool = unlocked;
            pool.sort_by(|&a, &b| {
                let ra = relatedness(ctx, state, &seed_candidate, a);
                let rb = relatedness(ctx, state, &seed_candidate, b);
                rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
            });
            pool.truncate(count);
            pool
        }
        DestroyKind::Field => {
            let mut fields: Vec<&croft_core::FieldId> = unlocked
                .iter()
                .map(|&i| &ctx.candidate(&state.placements[i].handle).field_id)
                .collect();
            fields.sort();
            fields.dedup();
            let chosen = *fields.choose(rng).expect("at least one field");
            unlocked
                .into_iter()
                .filter(|&i| &ctx.candidate(&state.placements[i].handle).field_id == chosen)
                .collect()
        }
        DestroyKind::TimeSlice => {
            let window = ctx.instance.window();
            let span = window.num_days();
            let width = (span / 4).max(14);
            let offset = rng.gen_range(0..span.max(1));
            let band_start = window.start + Duration::days(offset);
            let band_end = band_start + Duration::days(width);
            unlocked
                .into_iter()
                .filter(|&i| {
                    let c = ctx.candidate(&state.placements[i].handle);
                    c.start_date <= band_end && c.completion_date >= band_start
                })
                .collect()
        }
    };

    let mut removed = Vec::with_capacity(victims.len());
    let mut next = state.clone();
    let mut sorted = victims;
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    for index in sorted {
        removed.push(next.placements[index].handle.clone());
        next.placements.remove(index);
    }
    (next, removed)
}

fn profit_rate(
    ctx: &PlanContext<'_>,
    state: &SolutionState,
    evaluation: &crate::solution::Evaluation,
    index: usize,
) -> f64 {
    let candidate = ctx.candidate(&state.placements[index].handle);
    if candidate.growth_days == 0 {
        return 0.0;
    }
    evaluation.allocations[index].profit / f64::from(candidate.growth_days)
}

/// Similarity of placement `index` to the seed: shared field and crop
/// weigh most, then temporal proximity.
fn relatedness(
    ctx: &PlanContext<'_>,
    state: &SolutionState,
    seed: &croft_core::AllocationCandidate,
    index: usize,
) -> f64 {
    let other = ctx.candidate(&state.placements[index].handle);
    let mut score = 0.0;
    if other.field_id == seed.field_id {
        score += 2.0;
    }
    if other.crop_id == seed.crop_id {
        score += 1.5;
    }
    let gap = (other.start_date - seed.start_date).num_days().abs() as f64;
    score + 1.0 / (1.0 + gap / 30.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::generate_candidates;
    use crate::deadline::Deadline;
    use crate::greedy::construct_greedy;
    use crate::test_utils::{instance_with, simple_field, uniform_profile};
    use croft_core::{AlgorithmConfig, Objective};
    use rand::SeedableRng;

    #[test]
    fn test_destroy_removes_but_keeps_locked() {
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
        let mut start = construct_greedy(&ctx, &SolutionState::default(), &Deadline::unbounded());
        assert!(start.state.len() >= 3);
        start.state.placements[0].locked = true;
        let locked_id = start.state.placements[0].id;

        let mut rng = StdRng::seed_from_u64(5);
        for kind in DestroyKind::ALL {
            let (after, removed) = apply(kind, &ctx, &start.state, &mut rng, 0.3);
            assert_eq!(after.len() + removed.len(), start.state.len());
            assert!(
                after.placements.iter().any(|p| p.id == locked_id),
                "{:?} removed a locked placement",
                kind
            );
            if kind != DestroyKind::TimeSlice {
                // The band may legitimately miss everything; all other
                // operators must remove at least one placement.
                assert!(!removed.is_empty(), "{:?} removed nothing", kind);
            }
        }
    }
}
