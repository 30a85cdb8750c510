//! Shared builders for unit and integration tests.
//!
//! Deliberately small: a single-stage crop profile with a wide optimal
//! band, constant-temperature weather, and plain fields, so expected GDD
//! arithmetic stays readable in test assertions.

use chrono::{Duration, NaiveDate};
use croft_core::{
    Crop, CropId, CropProfile, Field, FieldId, InteractionRule, PlanningInstance,
    PlanningWindow, RuleId, RuleType, StageRequirement, StressSensitivity,
    TemperatureProfile, WeatherDay, WeatherSeries,
};

/// A forgiving thermal profile: base 10, optimal 18-30, max 40.
pub fn mild_profile() -> TemperatureProfile {
    TemperatureProfile {
        base_t: 10.0,
        optimal_min: 18.0,
        optimal_max: 30.0,
        max_t: 40.0,
        low_stress_t: 5.0,
        high_stress_t: 35.0,
        frost_t: 0.0,
        sterility_risk_t: None,
        impact_overrides: None,
    }
}

/// Single-stage crop: `required_gdd` total, optional revenue per m^2,
/// 1 m^2 per plant.
pub fn uniform_profile(id: &str, required_gdd: f64, revenue_per_area: Option<f64>) -> CropProfile {
    CropProfile {
        crop: Crop {
            id: CropId::new(id),
            name: id.to_uppercase(),
            variety: None,
            area_per_unit: 1.0,
            revenue_per_area,
            revenue_cap: None,
            groups: vec![],
        },
        stages: vec![StageRequirement {
            name: "growth".into(),
            order: 1,
            required_gdd,
            profile: mild_profile(),
            sensitivity: Some(StressSensitivity::uniform(0.5)),
        }],
    }
}

/// Constant-temperature series: mean as given, min = mean - 5,
/// max = mean + 5.
pub fn constant_weather(start: NaiveDate, num_days: usize, t_mean: f64) -> WeatherSeries {
    let days = (0..num_days)
        .map(|i| WeatherDay {
            t_mean: Some(t_mean),
            t_min: Some(t_mean - 5.0),
            t_max: Some(t_mean + 5.0),
            ..WeatherDay::new(start + Duration::days(i as i64))
        })
        .collect();
    WeatherSeries::from_days(days).unwrap()
}

pub fn simple_field(id: &str, area_m2: f64, daily_fixed_cost: f64, fallow_days: i64) -> Field {
    Field {
        id: FieldId::new(id),
        name: id.to_uppercase(),
        area_m2,
        daily_fixed_cost,
        fallow_period_days: fallow_days,
        groups: vec![],
    }
}

pub fn rule(
    id: &str,
    rule_type: RuleType,
    source: &str,
    target: &str,
    impact: f64,
) -> InteractionRule {
    InteractionRule {
        id: RuleId::new(id),
        rule_type,
        source_group: source.into(),
        target_group: target.into(),
        impact_ratio: impact,
        directional: true,
    }
}

/// Assemble an instance over the given window with constant weather.
pub fn instance_with(
    fields: Vec<Field>,
    profiles: Vec<CropProfile>,
    rules: Vec<InteractionRule>,
    start: &str,
    end: &str,
    t_mean: f64,
) -> PlanningInstance {
    let start: NaiveDate = start.parse().unwrap();
    let end: NaiveDate = end.parse().unwrap();
    let window = PlanningWindow::new(start, end).unwrap();
    let num_days = (end - start).num_days() as usize + 1;
    let weather = constant_weather(start, num_days, t_mean);
    PlanningInstance::new(fields, profiles, weather, rules, window).unwrap()
}
