//! The immutable problem instance threaded through every solver.

use crate::{
    CropId, CropProfile, CroftError, CroftResult, Field, FieldId, InteractionRule,
    PlanningWindow, WeatherSeries,
};
use std::collections::HashMap;

/// Fields, crop profiles, weather, interaction rules and the planning
/// window, with prebuilt ID indexes. Constructed once in the caller and
/// shared by reference; solvers never mutate it.
#[derive(Debug, Clone)]
pub struct PlanningInstance {
    fields: Vec<Field>,
    profiles: Vec<CropProfile>,
    weather: WeatherSeries,
    rules: Vec<InteractionRule>,
    window: PlanningWindow,
    field_index: HashMap<FieldId, usize>,
    profile_index: HashMap<CropId, usize>,
}

impl PlanningInstance {
    /// Build an instance, rejecting duplicate field or crop IDs.
    pub fn new(
        fields: Vec<Field>,
        profiles: Vec<CropProfile>,
        weather: WeatherSeries,
        rules: Vec<InteractionRule>,
        window: PlanningWindow,
    ) -> CroftResult<Self> {
        let mut field_index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field_index.insert(field.id.clone(), i).is_some() {
                return Err(CroftError::InvalidInput(format!(
                    "duplicate field id {}",
                    field.id
                )));
            }
        }
        let mut profile_index = HashMap::with_capacity(profiles.len());
        for (i, profile) in profiles.iter().enumerate() {
            if profile_index.insert(profile.crop.id.clone(), i).is_some() {
                return Err(CroftError::InvalidInput(format!(
                    "duplicate crop id {}",
                    profile.crop.id
                )));
            }
        }
        Ok(PlanningInstance {
            fields,
            profiles,
            weather,
            rules,
            window,
            field_index,
            profile_index,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn profiles(&self) -> &[CropProfile] {
        &self.profiles
    }

    pub fn weather(&self) -> &WeatherSeries {
        &self.weather
    }

    pub fn rules(&self) -> &[InteractionRule] {
        &self.rules
    }

    pub fn window(&self) -> &PlanningWindow {
        &self.window
    }

    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.field_index.get(id).map(|&i| &self.fields[i])
    }

    pub fn profile(&self, id: &CropId) -> Option<&CropProfile> {
        self.profile_index.get(id).map(|&i| &self.profiles[i])
    }

    /// Field lookup that surfaces a solver-facing error for unknown IDs.
    pub fn require_field(&self, id: &FieldId) -> CroftResult<&Field> {
        self.field(id)
            .ok_or_else(|| CroftError::InvalidInput(format!("unknown field id {}", id)))
    }

    pub fn require_profile(&self, id: &CropId) -> CroftResult<&CropProfile> {
        self.profile(id)
            .ok_or_else(|| CroftError::InvalidInput(format!("unknown crop id {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherDay;

    fn field(id: &str) -> Field {
        Field {
            id: FieldId::new(id),
            name: id.to_uppercase(),
            area_m2: 100.0,
            daily_fixed_cost: 1.0,
            fallow_period_days: 0,
            groups: vec![],
        }
    }

    fn weather() -> WeatherSeries {
        let start: chrono::NaiveDate = "2023-04-01".parse().unwrap();
        WeatherSeries::from_days(
            (0..30)
                .map(|i| WeatherDay::new(start + chrono::Duration::days(i)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let window =
            PlanningWindow::new("2023-04-01".parse().unwrap(), "2023-04-30".parse().unwrap())
                .unwrap();
        let result = PlanningInstance::new(
            vec![field("a"), field("a")],
            vec![],
            weather(),
            vec![],
            window,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup() {
        let window =
            PlanningWindow::new("2023-04-01".parse().unwrap(), "2023-04-30".parse().unwrap())
                .unwrap();
        let instance =
            PlanningInstance::new(vec![field("a")], vec![], weather(), vec![], window).unwrap();
        assert!(instance.field(&FieldId::new("a")).is_some());
        assert!(instance.field(&FieldId::new("b")).is_none());
        assert!(instance.require_field(&FieldId::new("b")).is_err());
    }
}
