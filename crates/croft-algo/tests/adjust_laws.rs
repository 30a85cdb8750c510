//! Adjust-operator laws and scenarios.

use croft_algo::test_utils::{instance_with, simple_field, uniform_profile};
use croft_algo::{adjust_allocation, optimize_allocation};
use croft_core::{
    AlgorithmConfig, CropId, FieldId, MoveAction, MoveInstruction, Plan, PlanningInstance,
};

fn setup() -> (PlanningInstance, AlgorithmConfig, Plan) {
    let instance = instance_with(
        vec![
            simple_field("a", 100.0, 1.0, 28),
            simple_field("b", 80.0, 1.0, 28),
        ],
        vec![
            uniform_profile("wheat", 150.0, Some(20.0)),
            uniform_profile("bean", 250.0, Some(30.0)),
        ],
        vec![],
        "2023-04-01",
        "2023-08-31",
        25.0,
    );
    let config = AlgorithmConfig {
        top_period_candidates: 30,
        ..AlgorithmConfig::default()
    };
    let plan = optimize_allocation(&instance, &config).unwrap();
    assert!(plan.allocation_count() >= 2);
    (instance, config, plan)
}

fn remove(id: &str) -> MoveInstruction {
    MoveInstruction {
        allocation_id: id.into(),
        action: MoveAction::Remove,
        target_field_id: None,
        target_crop_id: None,
        target_start_date: None,
        target_area: None,
    }
}

#[test]
fn empty_moves_is_identity() {
    let (instance, config, plan) = setup();
    let result = adjust_allocation(&plan, &[], &instance, &config).unwrap();
    assert!(result.success);
    assert!(result.applied_moves.is_empty());
    assert!(result.rejected_moves.is_empty());
    assert_eq!(result.plan, plan);
}

#[test]
fn all_unknown_ids_rejected_plan_unchanged() {
    let (instance, config, plan) = setup();
    let moves = vec![
        remove("00000000-0000-0000-0000-000000000001"),
        remove("not-even-a-uuid"),
    ];
    let result = adjust_allocation(&plan, &moves, &instance, &config).unwrap();
    assert!(!result.success);
    assert!(result.applied_moves.is_empty());
    assert_eq!(result.rejected_moves.len(), 2);
    for rejected in &result.rejected_moves {
        assert_eq!(rejected.reason, "unknown_allocation");
    }
    assert_eq!(result.plan, plan);
}

#[test]
fn remove_then_add_recovers_profit() {
    let (instance, config, plan) = setup();
    let victim = plan.allocations().next().unwrap().clone();
    let victim_field = plan
        .field_schedules
        .iter()
        .find(|s| s.allocations.iter().any(|a| a.allocation_id == victim.allocation_id))
        .unwrap()
        .field_id
        .clone();

    let removed = adjust_allocation(
        &plan,
        &[remove(&victim.allocation_id.to_string())],
        &instance,
        &config,
    )
    .unwrap();
    assert!(removed.success);

    let re_add = MoveInstruction {
        allocation_id: "re-add".into(),
        action: MoveAction::Add,
        target_field_id: Some(victim_field),
        target_crop_id: Some(victim.crop_id.clone()),
        target_start_date: Some(victim.start_date),
        target_area: Some(victim.area_used),
    };
    let restored = adjust_allocation(
        &plan,
        &[remove(&victim.allocation_id.to_string()), re_add],
        &instance,
        &config,
    )
    .unwrap();
    assert!(restored.success);
    assert!(restored.plan.total_profit >= removed.plan.total_profit - 1e-6);
}

#[test]
fn untouched_allocations_keep_their_ids() {
    let (instance, config, plan) = setup();
    let victim = plan.allocations().next().unwrap().allocation_id;
    let kept: Vec<_> = plan
        .allocations()
        .map(|a| a.allocation_id)
        .filter(|id| *id != victim)
        .collect();

    let result =
        adjust_allocation(&plan, &[remove(&victim.to_string())], &instance, &config).unwrap();
    for id in kept {
        assert!(
            result.plan.find_allocation(id).is_some(),
            "untouched allocation {} lost its identity",
            id
        );
    }
    assert!(result.plan.find_allocation(victim).is_none());
}

#[test]
fn fallow_violating_move_is_shifted_or_rejected() {
    // One field, 28-day fallow, one existing allocation; ask to add a
    // planting eight days after the existing completion. Either the
    // re-optimizer shifts it past the fallow gap or the move is
    // rejected; the final plan must honor the fallow invariant.
    let instance = instance_with(
        vec![simple_field("a", 100.0, 1.0, 28)],
        vec![uniform_profile("wheat", 150.0, Some(20.0))],
        vec![],
        "2023-04-01",
        "2023-08-31",
        25.0,
    );
    let config = AlgorithmConfig {
        top_period_candidates: 30,
        ..AlgorithmConfig::default()
    };
    let plan = optimize_allocation(&instance, &config).unwrap();
    let existing = plan.allocations().next().unwrap().clone();

    let target = existing.completion_date + chrono::Duration::days(8);
    let add = MoveInstruction {
        allocation_id: "late-add".into(),
        action: MoveAction::Add,
        target_field_id: Some(FieldId::new("a")),
        target_crop_id: Some(CropId::new("wheat")),
        target_start_date: Some(target),
        target_area: None,
    };
    let result = adjust_allocation(&plan, &[add], &instance, &config).unwrap();

    // Whatever the outcome, the invariant holds.
    for schedule in &result.plan.field_schedules {
        for pair in schedule.allocations.windows(2) {
            assert!((pair[1].start_date - pair[0].completion_date).num_days() >= 28);
        }
    }
    if !result.success {
        assert_eq!(result.rejected_moves.len(), 1);
        assert_eq!(
            result.rejected_moves[0].reason,
            "infeasible_after_optimization"
        );
    }
}

#[test]
fn move_to_other_field_lands_there() {
    let (instance, config, plan) = setup();
    // Move the first allocation on field a over to field b.
    let Some(victim) = plan
        .field_schedules
        .iter()
        .find(|s| s.field_id.as_str() == "a")
        .and_then(|s| s.allocations.first())
        .cloned()
    else {
        return;
    };

    let instruction = MoveInstruction {
        allocation_id: victim.allocation_id.to_string(),
        action: MoveAction::Move,
        target_field_id: Some(FieldId::new("b")),
        target_crop_id: None,
        target_start_date: None,
        target_area: None,
    };
    let result = adjust_allocation(&plan, &[instruction], &instance, &config).unwrap();
    if result.success {
        // The moved allocation lost its old identity and its crop now
        // appears on the target field.
        assert!(result.plan.find_allocation(victim.allocation_id).is_none());
        let b = result
            .plan
            .field_schedules
            .iter()
            .find(|s| s.field_id.as_str() == "b")
            .unwrap();
        assert!(b.allocations.iter().any(|a| a.crop_id == victim.crop_id));
    } else {
        // A lone rejected move leaves the plan untouched.
        assert_eq!(result.plan, plan);
        assert_eq!(
            result.rejected_moves[0].reason,
            "infeasible_after_optimization"
        );
    }
}
