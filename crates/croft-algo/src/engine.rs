//! The planning entry point: wire candidate generation to the configured
//! solver chain and assemble the plan.

use crate::alns::run_alns;
use crate::assemble::assemble_plan;
use crate::candidates::generate_candidates;
use crate::deadline::Deadline;
use crate::dp::solve_dp;
use crate::greedy::construct_greedy;
use crate::local_search::hill_climb;
use crate::solution::{PlanContext, SolutionState};
use crate::validation::validate_instance;
use croft_core::{Algorithm, AlgorithmConfig, CroftResult, Plan, PlanningInstance};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Produce a full allocation plan for the instance.
pub fn optimize_allocation(
    instance: &PlanningInstance,
    config: &AlgorithmConfig,
) -> CroftResult<Plan> {
    config.validate()?;
    validate_instance(instance)?;

    let pool = generate_candidates(instance, config)?;
    let ctx = PlanContext::new(instance, &pool, config.objective);
    let deadline = Deadline::from_config(config);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let (state, tag, timed_out) = match config.algorithm {
        Algorithm::Dp => {
            let outcome = solve_dp(&ctx, &SolutionState::default(), &deadline);
            (outcome.state, "dp", outcome.timed_out)
        }
        Algorithm::Greedy => {
            let mut outcome = construct_greedy(&ctx, &SolutionState::default(), &deadline);
            let mut tag = "greedy";
            if config.enable_local_search && !config.enable_alns {
                let climbed = hill_climb(&ctx, outcome.state, config, &mut rng, &deadline);
                outcome.state = climbed.state;
                outcome.timed_out |= climbed.timed_out;
            }
            if config.enable_alns {
                if config.enable_local_search {
                    let climbed = hill_climb(&ctx, outcome.state, config, &mut rng, &deadline);
                    outcome.state = climbed.state;
                    outcome.timed_out |= climbed.timed_out;
                }
                let alns = run_alns(&ctx, outcome.state, config, &mut rng, &deadline);
                outcome.state = alns.state;
                outcome.timed_out |= alns.timed_out;
                tag = "greedy+alns";
            }
            (outcome.state, tag, outcome.timed_out)
        }
    };

    let plan = assemble_plan(&ctx, &state, tag, config.seed, timed_out)?;
    info!(
        algorithm = tag,
        allocations = plan.allocation_count(),
        profit = plan.total_profit,
        timed_out,
        "optimization finished"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{instance_with, simple_field, uniform_profile};

    fn instance() -> PlanningInstance {
        instance_with(
            vec![
                simple_field("a", 100.0, 1.0, 7),
                simple_field("b", 80.0, 2.0, 7),
            ],
            vec![
                uniform_profile("wheat", 150.0, Some(20.0)),
                uniform_profile("bean", 250.0, Some(30.0)),
            ],
            vec![],
            "2023-04-01",
            "2023-07-31",
            25.0,
        )
    }

    #[test]
    fn test_dp_and_greedy_produce_valid_plans() {
        let instance = instance();
        for algorithm in [Algorithm::Dp, Algorithm::Greedy] {
            let config = AlgorithmConfig {
                algorithm,
                top_period_candidates: 20,
                ..AlgorithmConfig::default()
            };
            let plan = optimize_allocation(&instance, &config).unwrap();
            assert!(plan.total_profit > 0.0, "{:?} made no profit", algorithm);
            assert!(!plan.timed_out);
        }
    }

    #[test]
    fn test_algorithm_tags() {
        let instance = instance();
        let greedy_alns = AlgorithmConfig {
            algorithm: Algorithm::Greedy,
            enable_alns: true,
            alns_iterations: 20,
            top_period_candidates: 10,
            ..AlgorithmConfig::default()
        };
        let plan = optimize_allocation(&instance, &greedy_alns).unwrap();
        assert_eq!(plan.algorithm_used, "greedy+alns");

        let dp = AlgorithmConfig::default();
        let plan = optimize_allocation(&instance, &dp).unwrap();
        assert_eq!(plan.algorithm_used, "dp");
    }

    #[test]
    fn test_empty_fields_empty_plan() {
        let instance = instance_with(
            vec![],
            vec![uniform_profile("wheat", 150.0, Some(20.0))],
            vec![],
            "2023-04-01",
            "2023-07-31",
            25.0,
        );
        let plan = optimize_allocation(&instance, &AlgorithmConfig::default()).unwrap();
        assert!(plan.field_schedules.is_empty());
        assert_eq!(plan.total_profit, 0.0);
        assert_eq!(plan.total_cost, 0.0);
        assert_eq!(plan.total_revenue, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let instance = instance();
        let bad = AlgorithmConfig {
            alns_removal_rate: 2.0,
            ..AlgorithmConfig::default()
        };
        assert!(optimize_allocation(&instance, &bad).is_err());
    }
}
