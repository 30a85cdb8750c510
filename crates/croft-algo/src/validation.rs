//! Instance validation: run before any solver touches the data.
//!
//! Surfaces `InvalidInput` / `MissingWeather` immediately; per-candidate
//! infeasibility is not checked here (it is recovered locally during
//! generation).

use croft_core::{CroftError, CroftResult, PlanningInstance};
use std::collections::HashSet;

/// Validate fields, profiles, rules and weather coverage.
///
/// Weather must cover the window start; a missing tail is tolerated
/// (growth walks treat absent days as zero GDD, so affected periods
/// surface as incomplete and are excluded).
pub fn validate_instance(instance: &PlanningInstance) -> CroftResult<()> {
    for field in instance.fields() {
        field.validate()?;
    }
    for profile in instance.profiles() {
        profile.validate()?;
    }
    let mut rule_ids = HashSet::new();
    for rule in instance.rules() {
        rule.validate()?;
        if !rule_ids.insert(&rule.id) {
            return Err(CroftError::InvalidInput(format!(
                "duplicate rule id {}",
                rule.id
            )));
        }
    }

    let window = instance.window();
    let weather = instance.weather();
    if weather.start() > window.start {
        return Err(CroftError::MissingWeather(format!(
            "weather begins {} but the planning window starts {}",
            weather.start(),
            window.start
        )));
    }
    if weather.end() < window.start {
        return Err(CroftError::MissingWeather(format!(
            "weather ends {} before the planning window starts {}",
            weather.end(),
            window.start
        )));
    }
    Ok(())
}
