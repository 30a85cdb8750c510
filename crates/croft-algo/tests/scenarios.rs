//! End-to-end planning scenarios.

use chrono::NaiveDate;
use croft_algo::test_utils::{mild_profile, rule, simple_field};
use croft_algo::{growth::simulate_growth, optimize_allocation};
use croft_core::{
    Algorithm, AlgorithmConfig, Crop, CropId, CropProfile, PlanningInstance, PlanningWindow,
    RuleType, StageRequirement, WeatherDay, WeatherSeries,
};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// April-October series whose daily mean ramps 18 -> 28 -> 18.
fn season_weather() -> WeatherSeries {
    let start = d("2023-04-01");
    let end = d("2023-10-31");
    let total = (end - start).num_days() + 1;
    let days = (0..total)
        .map(|i| {
            let phase = i as f64 / total as f64; // 0..1 over the season
            let mean = 18.0 + 10.0 * (std::f64::consts::PI * phase).sin();
            WeatherDay {
                t_mean: Some(mean),
                t_min: Some(mean - 5.0),
                t_max: Some(mean + 5.0),
                ..WeatherDay::new(start + chrono::Duration::days(i))
            }
        })
        .collect();
    WeatherSeries::from_days(days).unwrap()
}

fn single_stage_crop(id: &str, required_gdd: f64, revenue: f64) -> CropProfile {
    CropProfile {
        crop: Crop {
            id: CropId::new(id),
            name: id.to_uppercase(),
            variety: None,
            area_per_unit: 1.0,
            revenue_per_area: Some(revenue),
            revenue_cap: None,
            groups: vec![],
        },
        stages: vec![StageRequirement {
            name: "growth".into(),
            order: 1,
            required_gdd,
            profile: mild_profile(),
            sensitivity: None,
        }],
    }
}

#[test]
fn scenario_single_field_single_crop() {
    let window = PlanningWindow::new(d("2023-04-01"), d("2023-10-31")).unwrap();
    let instance = PlanningInstance::new(
        vec![simple_field("a", 1000.0, 50.0, 28)],
        vec![single_stage_crop("maize", 1800.0, 100.0)],
        season_weather(),
        vec![],
        window,
    )
    .unwrap();

    let plan = optimize_allocation(&instance, &AlgorithmConfig::default()).unwrap();
    assert!(plan.allocation_count() >= 1);
    let first = plan.allocations().next().unwrap();
    assert!(
        (100..=160).contains(&first.growth_days),
        "growth_days = {}",
        first.growth_days
    );
    assert!((first.yield_factor - 1.0).abs() < 1e-9);
    assert!(plan.total_profit > 0.0);
}

#[test]
fn scenario_continuous_cropping_penalty() {
    let mut x = single_stage_crop("tomato", 300.0, 30.0);
    x.crop.groups = vec!["Solanaceae".into()];
    let mut y = single_stage_crop("eggplant", 300.0, 30.0);
    y.crop.groups = vec!["Solanaceae".into()];

    let window = PlanningWindow::new(d("2023-04-01"), d("2023-10-31")).unwrap();
    let instance = PlanningInstance::new(
        vec![simple_field("a", 100.0, 1.0, 0)],
        vec![x, y],
        season_weather(),
        vec![rule(
            "cc",
            RuleType::ContinuousCultivation,
            "Solanaceae",
            "Solanaceae",
            0.5,
        )],
        window,
    )
    .unwrap();

    let config = AlgorithmConfig {
        top_period_candidates: 150,
        ..AlgorithmConfig::default()
    };
    let plan = optimize_allocation(&instance, &config).unwrap();
    let schedule = &plan.field_schedules[0];
    assert!(
        schedule.allocations.len() >= 2,
        "expected repeated plantings on the field"
    );

    // The first planting is unpenalized; every follow-up in the same
    // family carries the recorded 0.5 multiplier.
    assert_eq!(schedule.allocations[0].interaction_impact, 1.0);
    for follow_up in &schedule.allocations[1..] {
        assert_eq!(follow_up.interaction_impact, 0.5);
    }
    // Totals stay the sum of parts under the penalty.
    let sum: f64 = plan.allocations().map(|a| a.profit).sum();
    assert!((plan.total_profit - sum).abs() < 1e-6);
}

#[test]
fn scenario_revenue_cap_binding() {
    let mut gold = single_stage_crop("saffron", 600.0, 2000.0);
    // One full field of 500 m2 earns 1,000,000: the cap admits exactly
    // one field's worth.
    gold.crop.revenue_cap = Some(1_000_000.0);

    let window = PlanningWindow::new(d("2023-04-01"), d("2023-10-31")).unwrap();
    let instance = PlanningInstance::new(
        vec![
            simple_field("cheap", 500.0, 10.0, 28),
            simple_field("dear", 500.0, 500.0, 28),
        ],
        vec![gold],
        season_weather(),
        vec![],
        window,
    )
    .unwrap();

    let config = AlgorithmConfig {
        algorithm: Algorithm::Greedy,
        ..AlgorithmConfig::default()
    };
    let plan = optimize_allocation(&instance, &config).unwrap();

    let revenue: f64 = plan.allocations().map(|a| a.expected_revenue).sum();
    assert!(revenue <= 1_000_000.0 + 1e-6);
    // The higher-profit-rate field carries the crop.
    let cheap = plan
        .field_schedules
        .iter()
        .find(|s| s.field_id.as_str() == "cheap")
        .unwrap();
    let dear = plan
        .field_schedules
        .iter()
        .find(|s| s.field_id.as_str() == "dear")
        .unwrap();
    assert!(!cheap.allocations.is_empty());
    assert!(cheap.total_revenue >= dear.total_revenue);
}

#[test]
fn scenario_sterility_stress_yield() {
    // Single flowering stage with sterility risk at 35C and three
    // consecutive 36C days during growth:
    // yield = 1 - 0.20 * 3 * 1.0 = 0.4.
    let mut crop = single_stage_crop("rice", 150.0, 40.0);
    crop.stages[0].name = "flowering".into();
    crop.stages[0].profile.sterility_risk_t = Some(35.0);

    let start = d("2023-06-01");
    let mut days: Vec<WeatherDay> = (0..30)
        .map(|i| WeatherDay {
            t_mean: Some(25.0),
            t_min: Some(20.0),
            t_max: Some(30.0),
            ..WeatherDay::new(start + chrono::Duration::days(i))
        })
        .collect();
    for day in days.iter_mut().take(6).skip(3) {
        day.t_max = Some(36.0);
    }
    let weather = WeatherSeries::from_days(days).unwrap();

    // 15 GDD/day: matures on day 10, covering the three hot days.
    let result = simulate_growth(&crop, start, &weather, d("2023-06-30"))
        .matured()
        .unwrap();
    assert_eq!(result.growth_days, 10);
    assert!(
        (result.yield_factor - 0.4).abs() < 1e-3,
        "yield_factor = {}",
        result.yield_factor
    );
}

#[test]
fn boundary_empty_crops() {
    let window = PlanningWindow::new(d("2023-04-01"), d("2023-10-31")).unwrap();
    let instance = PlanningInstance::new(
        vec![simple_field("a", 100.0, 1.0, 28)],
        vec![],
        season_weather(),
        vec![],
        window,
    )
    .unwrap();
    let plan = optimize_allocation(&instance, &AlgorithmConfig::default()).unwrap();
    assert_eq!(plan.field_schedules.len(), 1);
    assert!(plan.field_schedules[0].allocations.is_empty());
    assert_eq!(plan.total_profit, 0.0);
}

#[test]
fn boundary_giant_fallow_limits_to_one_allocation() {
    let window = PlanningWindow::new(d("2023-04-01"), d("2023-10-31")).unwrap();
    let instance = PlanningInstance::new(
        vec![simple_field("a", 100.0, 1.0, 400)],
        vec![single_stage_crop("wheat", 300.0, 20.0)],
        season_weather(),
        vec![],
        window,
    )
    .unwrap();
    let plan = optimize_allocation(&instance, &AlgorithmConfig::default()).unwrap();
    assert!(plan.field_schedules[0].allocations.len() <= 1);
}

#[test]
fn boundary_zero_fallow_back_to_back() {
    // Constant 25C: 15 GDD/day, so 150 GDD takes exactly 10 days. A
    // 40-day window fits four plantings only when each starts the day
    // after its predecessor completes.
    let instance = croft_algo::test_utils::instance_with(
        vec![simple_field("a", 100.0, 1.0, 0)],
        vec![croft_algo::test_utils::uniform_profile("wheat", 150.0, Some(20.0))],
        vec![],
        "2023-04-01",
        "2023-05-10",
        25.0,
    );
    let config = AlgorithmConfig {
        top_period_candidates: 250,
        ..AlgorithmConfig::default()
    };
    let plan = optimize_allocation(&instance, &config).unwrap();
    let schedule = &plan.field_schedules[0];
    assert_eq!(schedule.allocations.len(), 4);
    for pair in schedule.allocations.windows(2) {
        assert_eq!(
            (pair[1].start_date - pair[0].completion_date).num_days(),
            1
        );
    }
}
