//! Plan assembly and invariant enforcement.
//!
//! Groups the accepted placements by field, sorts each schedule by start
//! date, verifies every plan invariant, and emits the final [`Plan`]
//! value with a fresh optimization ID. An invariant failure here means a
//! solver bug, never bad input, so it surfaces as `InvariantViolation`
//! with enough context to reproduce.

use crate::solution::{PlanContext, SolutionState};
use croft_core::{
    CropAllocation, CroftError, CroftResult, CropTotals, FieldSchedule, Plan,
};
use std::collections::HashMap;

const MONEY_TOLERANCE: f64 = 1e-6;

/// Build the final plan from an evaluated state.
pub fn assemble_plan(
    ctx: &PlanContext<'_>,
    state: &SolutionState,
    algorithm_tag: &str,
    seed: u64,
    timed_out: bool,
) -> CroftResult<Plan> {
    let evaluation = ctx.evaluate(state);

    // One schedule per instance field, even when empty.
    let mut schedules: Vec<FieldSchedule> = ctx
        .instance
        .fields()
        .iter()
        .map(|field| FieldSchedule {
            field_id: field.id.clone(),
            field_name: field.name.clone(),
            allocations: Vec::new(),
            total_cost: 0.0,
            total_revenue: 0.0,
            total_profit: 0.0,
        })
        .collect();
    let index_of: HashMap<_, _> = ctx
        .instance
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id.clone(), i))
        .collect();

    for (placement, scored) in state.placements.iter().zip(&evaluation.allocations) {
        let candidate = ctx.candidate(&placement.handle);
        let schedule_index = *index_of.get(&candidate.field_id).ok_or_else(|| {
            CroftError::InvariantViolation(format!(
                "allocation {} references unknown field {}",
                placement.id, candidate.field_id
            ))
        })?;
        schedules[schedule_index].allocations.push(CropAllocation {
            allocation_id: placement.id,
            crop_id: candidate.crop_id.clone(),
            crop_name: candidate.crop_name.clone(),
            start_date: candidate.start_date,
            completion_date: candidate.completion_date,
            growth_days: candidate.growth_days,
            area_used: candidate.area_used,
            quantity: candidate.quantity,
            total_cost: scored.cost,
            expected_revenue: scored.revenue.unwrap_or(0.0),
            profit: scored.profit,
            yield_factor: candidate.yield_factor,
            interaction_impact: scored.interaction_impact,
        });
    }

    for schedule in &mut schedules {
        schedule.allocations.sort_by_key(|a| a.start_date);
        schedule.total_cost = schedule.allocations.iter().map(|a| a.total_cost).sum();
        schedule.total_revenue = schedule
            .allocations
            .iter()
            .map(|a| a.expected_revenue)
            .sum();
        schedule.total_profit = schedule.allocations.iter().map(|a| a.profit).sum();
    }

    verify_invariants(ctx, &schedules)?;

    let total_cost = schedules.iter().map(|s| s.total_cost).sum();
    let total_revenue = schedules.iter().map(|s| s.total_revenue).sum();
    let total_profit = schedules.iter().map(|s| s.total_profit).sum();

    Ok(Plan {
        optimization_id: uuid::Uuid::new_v4().to_string(),
        algorithm_used: algorithm_tag.to_string(),
        seed: Some(seed),
        timed_out,
        total_profit,
        total_cost,
        total_revenue,
        field_schedules: schedules,
        crop_totals: crop_totals(ctx, state, &evaluation),
        infeasible_pairs: ctx.pool.infeasible_pairs,
    })
}

fn crop_totals(
    ctx: &PlanContext<'_>,
    state: &SolutionState,
    evaluation: &crate::solution::Evaluation,
) -> Vec<CropTotals> {
    let mut totals: HashMap<croft_core::CropId, CropTotals> = HashMap::new();
    for (placement, scored) in state.placements.iter().zip(&evaluation.allocations) {
        let candidate = ctx.candidate(&placement.handle);
        let entry = totals
            .entry(candidate.crop_id.clone())
            .or_insert_with(|| CropTotals {
                crop_id: candidate.crop_id.clone(),
                crop_name: candidate.crop_name.clone(),
                allocation_count: 0,
                revenue: 0.0,
                cost: 0.0,
                profit: 0.0,
                revenue_cap: candidate.revenue_cap,
            });
        entry.allocation_count += 1;
        entry.revenue += scored.revenue.unwrap_or(0.0);
        entry.cost += scored.cost;
        entry.profit += scored.profit;
    }
    let mut list: Vec<CropTotals> = totals.into_values().collect();
    list.sort_by(|a, b| a.crop_id.cmp(&b.crop_id));
    list
}

fn verify_invariants(ctx: &PlanContext<'_>, schedules: &[FieldSchedule]) -> CroftResult<()> {
    let window = ctx.instance.window();
    let mut crop_revenue: HashMap<croft_core::CropId, f64> = HashMap::new();

    for schedule in schedules {
        let field = ctx.instance.require_field(&schedule.field_id)?;
        for allocation in &schedule.allocations {
            if allocation.growth_days == 0 || allocation.start_date >= allocation.completion_date {
                return Err(CroftError::InvariantViolation(format!(
                    "allocation {} on {}: degenerate interval {}..{}",
                    allocation.allocation_id,
                    schedule.field_id,
                    allocation.start_date,
                    allocation.completion_date
                )));
            }
            if !window.contains(allocation.start_date)
                || !window.contains(allocation.completion_date)
            {
                return Err(CroftError::InvariantViolation(format!(
                    "allocation {} on {}: interval {}..{} outside planning window",
                    allocation.allocation_id,
                    schedule.field_id,
                    allocation.start_date,
                    allocation.completion_date
                )));
            }
            if allocation.area_used > field.area_m2 + 1e-9 {
                return Err(CroftError::InvariantViolation(format!(
                    "allocation {} on {}: area {} exceeds field area {}",
                    allocation.allocation_id,
                    schedule.field_id,
                    allocation.area_used,
                    field.area_m2
                )));
            }
            if !(0.0..=1.0).contains(&allocation.yield_factor) {
                return Err(CroftError::InvariantViolation(format!(
                    "allocation {}: yield factor {} outside [0, 1]",
                    allocation.allocation_id, allocation.yield_factor
                )));
            }
            *crop_revenue.entry(allocation.crop_id.clone()).or_default() +=
                allocation.expected_revenue;
        }
        for pair in schedule.allocations.windows(2) {
            let gap = (pair[1].start_date - pair[0].completion_date).num_days();
            if gap < field.fallow_period_days.max(1) {
                return Err(CroftError::InvariantViolation(format!(
                    "field {}: allocations {} and {} violate the {}-day fallow period",
                    schedule.field_id,
                    pair[0].allocation_id,
                    pair[1].allocation_id,
                    field.fallow_period_days
                )));
            }
        }
    }

    for (crop_id, revenue) in crop_revenue {
        if let Some(profile) = ctx.instance.profile(&crop_id) {
            if let Some(cap) = profile.crop.revenue_cap {
                if revenue > cap + MONEY_TOLERANCE {
                    return Err(CroftError::InvariantViolation(format!(
                        "crop {}: total revenue {} exceeds cap {}",
                        crop_id, revenue, cap
                    )));
                }
            }
        }
    }
    Ok(())
}
