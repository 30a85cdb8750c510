//! Field records: cultivable land with area, fixed cost and fallow policy.

use crate::{CroftError, CroftResult, FieldId};
use serde::{Deserialize, Serialize};

/// Required rest days on a field between two allocations.
pub const DEFAULT_FALLOW_PERIOD_DAYS: i64 = 28;

/// A cultivable field. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    /// Usable area in square metres. Must be > 0.
    pub area_m2: f64,
    /// Fixed cost per occupied day (currency/day). Must be >= 0.
    pub daily_fixed_cost: f64,
    /// Rest days required between two allocations on this field.
    #[serde(default = "default_fallow_period_days")]
    pub fallow_period_days: i64,
    /// Group tags used by soil/climate compatibility rules
    /// (e.g. `acidic_soil`).
    #[serde(default)]
    pub groups: Vec<String>,
}

fn default_fallow_period_days() -> i64 {
    DEFAULT_FALLOW_PERIOD_DAYS
}

impl Field {
    pub fn validate(&self) -> CroftResult<()> {
        if !(self.area_m2 > 0.0) {
            return Err(CroftError::InvalidInput(format!(
                "field {}: area must be positive, got {}",
                self.id, self.area_m2
            )));
        }
        if !(self.daily_fixed_cost >= 0.0) {
            return Err(CroftError::InvalidInput(format!(
                "field {}: daily fixed cost must be non-negative, got {}",
                self.id, self.daily_fixed_cost
            )));
        }
        if self.fallow_period_days < 0 {
            return Err(CroftError::InvalidInput(format!(
                "field {}: fallow period must be non-negative, got {}",
                self.id, self.fallow_period_days
            )));
        }
        Ok(())
    }

    /// Whether this field carries the given group tag.
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
