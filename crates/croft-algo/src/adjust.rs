//! Allocation adjustment: apply user move/remove/add directives to an
//! existing plan and re-optimize the residual.
//!
//! Instruction failures never abort the run: each invalid or ultimately
//! unplaceable instruction lands in `rejected_moves` with a reason
//! string. Untouched allocations are mandatory; they stay locked in the
//! working state and shrink the feasible region of the re-optimization.
//! A `move` or `add` whose target cannot be placed even after
//! re-optimization is dropped and surfaced with reason
//! `infeasible_after_optimization`.

use crate::alns::run_alns;
use crate::candidates::generate_candidates;
use crate::deadline::Deadline;
use crate::dp::solve_dp;
use crate::greedy::construct_greedy;
use crate::growth::simulate_growth;
use crate::local_search::hill_climb;
use crate::solution::{CandidateHandle, PlanContext, Placement, SolutionState};
use crate::{assemble::assemble_plan, validation::validate_instance};
use croft_core::{
    Algorithm, AlgorithmConfig, AllocationCandidate, AllocationId, CropAllocation, CropId,
    CroftResult, FieldId, MoveAction, MoveInstruction, Plan, PlanningInstance,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// One instruction that could not be applied, with the reason.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RejectedMove {
    pub instruction: MoveInstruction,
    pub reason: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AdjustResult {
    /// False when every instruction was rejected (the plan is returned
    /// unchanged).
    pub success: bool,
    pub applied_moves: Vec<MoveInstruction>,
    pub rejected_moves: Vec<RejectedMove>,
    pub plan: Plan,
}

/// A validated move/add whose placement is delegated to re-optimization.
struct PendingPlacement {
    instruction_index: usize,
    crop_id: CropId,
    field_id: FieldId,
    candidate: Option<AllocationCandidate>,
}

/// Apply `moves` to `plan` and re-optimize the residual.
pub fn adjust_allocation(
    plan: &Plan,
    moves: &[MoveInstruction],
    instance: &PlanningInstance,
    config: &AlgorithmConfig,
) -> CroftResult<AdjustResult> {
    config.validate()?;
    validate_instance(instance)?;

    if moves.is_empty() {
        return Ok(AdjustResult {
            success: true,
            applied_moves: vec![],
            rejected_moves: vec![],
            plan: plan.clone(),
        });
    }

    let mut rejected: Vec<RejectedMove> = Vec::new();
    let mut touched: HashMap<AllocationId, usize> = HashMap::new();
    let mut pending: Vec<PendingPlacement> = Vec::new();
    let mut removals: Vec<usize> = Vec::new();

    let window = instance.window();
    for (index, instruction) in moves.iter().enumerate() {
        if let Err(err) = instruction.validate() {
            rejected.push(RejectedMove {
                instruction: instruction.clone(),
                reason: format!("invalid_instruction: {}", err),
            });
            continue;
        }
        match instruction.action {
            MoveAction::Remove | MoveAction::Move => {
                let Some(id) = AllocationId::parse(&instruction.allocation_id) else {
                    rejected.push(RejectedMove {
                        instruction: instruction.clone(),
                        reason: "unknown_allocation".into(),
                    });
                    continue;
                };
                let Some((field_id, allocation)) = plan.find_allocation(id) else {
                    rejected.push(RejectedMove {
                        instruction: instruction.clone(),
                        reason: "unknown_allocation".into(),
                    });
                    continue;
                };
                if touched.contains_key(&id) {
                    rejected.push(RejectedMove {
                        instruction: instruction.clone(),
                        reason: "allocation_already_touched".into(),
                    });
                    continue;
                }
                if instruction.action == MoveAction::Remove {
                    touched.insert(id, index);
                    removals.push(index);
                    continue;
                }
                // Move: referential checks on the target, then delegate
                // placement to re-optimization.
                if let Some(target_field) = &instruction.target_field_id {
                    if instance.field(target_field).is_none() {
                        rejected.push(RejectedMove {
                            instruction: instruction.clone(),
                            reason: "unknown_field".into(),
                        });
                        continue;
                    }
                }
                if let Some(start) = instruction.target_start_date {
                    if !window.contains(start) {
                        rejected.push(RejectedMove {
                            instruction: instruction.clone(),
                            reason: "date_outside_window".into(),
                        });
                        continue;
                    }
                }
                touched.insert(id, index);
                let target_field = instruction
                    .target_field_id
                    .clone()
                    .unwrap_or_else(|| field_id.clone());
                let start = instruction
                    .target_start_date
                    .unwrap_or(allocation.start_date);
                let area = instruction.target_area.unwrap_or(allocation.area_used);
                pending.push(PendingPlacement {
                    instruction_index: index,
                    crop_id: allocation.crop_id.clone(),
                    field_id: target_field.clone(),
                    candidate: synthesize_candidate(
                        instance,
                        &target_field,
                        &allocation.crop_id,
                        start,
                        Some(area),
                    ),
                });
            }
            MoveAction::Add => {
                // validate() guarantees the targets are present.
                let field_id = instruction.target_field_id.clone().expect("validated");
                let crop_id = instruction.target_crop_id.clone().expect("validated");
                let start = instruction.target_start_date.expect("validated");
                if instance.field(&field_id).is_none() {
                    rejected.push(RejectedMove {
                        instruction: instruction.clone(),
                        reason: "unknown_field".into(),
                    });
                    continue;
                }
                if instance.profile(&crop_id).is_none() {
                    rejected.push(RejectedMove {
                        instruction: instruction.clone(),
                        reason: "unknown_crop".into(),
                    });
                    continue;
                }
                if !window.contains(start) {
                    rejected.push(RejectedMove {
                        instruction: instruction.clone(),
                        reason: "date_outside_window".into(),
                    });
                    continue;
                }
                pending.push(PendingPlacement {
                    instruction_index: index,
                    crop_id: crop_id.clone(),
                    field_id: field_id.clone(),
                    candidate: synthesize_candidate(
                        instance,
                        &field_id,
                        &crop_id,
                        start,
                        instruction.target_area,
                    ),
                });
            }
        }
    }

    if removals.is_empty() && pending.is_empty() {
        info!(rejected = rejected.len(), "every adjust move was rejected");
        return Ok(AdjustResult {
            success: false,
            applied_moves: vec![],
            rejected_moves: rejected,
            plan: plan.clone(),
        });
    }

    // Residual: untouched allocations become locked placements with
    // their original IDs.
    let mut base = SolutionState::default();
    for schedule in &plan.field_schedules {
        for allocation in &schedule.allocations {
            if touched.contains_key(&allocation.allocation_id) {
                continue;
            }
            base.placements.push(Placement {
                handle: CandidateHandle::Owned(Arc::new(rebuild_candidate(
                    instance,
                    &schedule.field_id,
                    allocation,
                ))),
                id: allocation.allocation_id,
                locked: true,
            });
        }
    }

    let pool = generate_candidates(instance, config)?;
    let ctx = PlanContext::new(instance, &pool, config.objective);
    let deadline = Deadline::from_config(config);
    let mut rng = StdRng::seed_from_u64(config.seed);

    // Seed the requested placements where they fit as-is; the solvers
    // may still improve or displace them.
    for request in &pending {
        if let Some(candidate) = &request.candidate {
            if ctx.can_insert(&base, candidate) {
                base = base.with(CandidateHandle::Owned(Arc::new(candidate.clone())), false);
            }
        }
    }

    let (outcome, tag) = match config.algorithm {
        Algorithm::Dp => (solve_dp(&ctx, &base, &deadline), "adjust+dp"),
        Algorithm::Greedy => {
            let mut outcome = construct_greedy(&ctx, &base, &deadline);
            if config.enable_alns {
                let alns = run_alns(&ctx, outcome.state, config, &mut rng, &deadline);
                outcome.state = alns.state;
                outcome.timed_out |= alns.timed_out;
            } else if config.enable_local_search {
                let climbed = hill_climb(&ctx, outcome.state, config, &mut rng, &deadline);
                outcome.state = climbed.state;
                outcome.timed_out |= climbed.timed_out;
            }
            (outcome, "adjust+greedy")
        }
    };

    // Post-check: which pending placements made it into the final state?
    let mut slots: HashMap<(CropId, FieldId), usize> = HashMap::new();
    for placement in &outcome.state.placements {
        if placement.locked {
            continue;
        }
        let candidate = ctx.candidate(&placement.handle);
        *slots
            .entry((candidate.crop_id.clone(), candidate.field_id.clone()))
            .or_default() += 1;
    }

    let mut applied: Vec<MoveInstruction> = removals.iter().map(|&i| moves[i].clone()).collect();
    for request in &pending {
        let key = (request.crop_id.clone(), request.field_id.clone());
        match slots.get_mut(&key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                applied.push(moves[request.instruction_index].clone());
            }
            _ => {
                rejected.push(RejectedMove {
                    instruction: moves[request.instruction_index].clone(),
                    reason: "infeasible_after_optimization".into(),
                });
            }
        }
    }

    if applied.is_empty() {
        info!(rejected = rejected.len(), "every adjust move was rejected");
        return Ok(AdjustResult {
            success: false,
            applied_moves: vec![],
            rejected_moves: rejected,
            plan: plan.clone(),
        });
    }

    debug!(
        applied = applied.len(),
        rejected = rejected.len(),
        "adjust re-optimization finished"
    );
    let plan = assemble_plan(&ctx, &outcome.state, tag, config.seed, outcome.timed_out)?;
    Ok(AdjustResult {
        success: true,
        applied_moves: applied,
        rejected_moves: rejected,
        plan,
    })
}

/// Build a synthetic candidate for an explicit (field, crop, start)
/// target by simulating growth at exactly that start. `None` when the
/// crop cannot complete from there or the area is too small for one
/// plant unit.
fn synthesize_candidate(
    instance: &PlanningInstance,
    field_id: &FieldId,
    crop_id: &CropId,
    start: chrono::NaiveDate,
    area: Option<f64>,
) -> Option<AllocationCandidate> {
    let field = instance.field(field_id)?;
    let profile = instance.profile(crop_id)?;
    let target_area = area.unwrap_or(field.area_m2).min(field.area_m2);
    let quantity = (target_area / profile.crop.area_per_unit).floor() as u32;
    if quantity == 0 {
        return None;
    }
    let growth =
        simulate_growth(profile, start, instance.weather(), instance.window().end).matured()?;
    if growth.completion_date <= start {
        return None;
    }
    Some(AllocationCandidate {
        field_id: field.id.clone(),
        crop_id: profile.crop.id.clone(),
        crop_name: profile.crop.name.clone(),
        start_date: start,
        completion_date: growth.completion_date,
        growth_days: growth.growth_days,
        area_used: f64::from(quantity) * profile.crop.area_per_unit,
        quantity,
        yield_factor: growth.yield_factor,
        daily_fixed_cost: field.daily_fixed_cost,
        revenue_per_area: profile.crop.revenue_per_area,
        revenue_cap: profile.crop.revenue_cap,
    })
}

/// Reconstruct the candidate snapshot behind a committed allocation.
fn rebuild_candidate(
    instance: &PlanningInstance,
    field_id: &FieldId,
    allocation: &CropAllocation,
) -> AllocationCandidate {
    let field = instance.field(field_id);
    let profile = instance.profile(&allocation.crop_id);
    AllocationCandidate {
        field_id: field_id.clone(),
        crop_id: allocation.crop_id.clone(),
        crop_name: allocation.crop_name.clone(),
        start_date: allocation.start_date,
        completion_date: allocation.completion_date,
        growth_days: allocation.growth_days,
        area_used: allocation.area_used,
        quantity: allocation.quantity,
        yield_factor: allocation.yield_factor,
        daily_fixed_cost: field.map_or(0.0, |f| f.daily_fixed_cost),
        revenue_per_area: profile.and_then(|p| p.crop.revenue_per_area),
        revenue_cap: profile.and_then(|p| p.crop.revenue_cap),
    }
}
