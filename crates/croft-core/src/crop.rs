//! Crop records and thermal requirement profiles.
//!
//! A [`CropProfile`] pairs a [`Crop`] (identity, area-per-unit, revenue
//! parameters, group tags) with an ordered list of [`StageRequirement`]s.
//! Each stage carries a [`TemperatureProfile`] defining the trapezoidal
//! GDD response and the stress thresholds, plus per-stress sensitivity
//! coefficients used by the yield-factor computation.

use crate::{CropId, CroftError, CroftResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A crop variety. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: CropId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    /// Ground area consumed per plant unit (m^2/plant). Must be > 0.
    pub area_per_unit: f64,
    /// Revenue per square metre at full yield (currency/m^2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_per_area: Option<f64>,
    /// Per-season revenue cap across all allocations of this crop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_cap: Option<f64>,
    /// Group tags used by interaction rules (e.g. `Solanaceae`).
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Crop {
    pub fn validate(&self) -> CroftResult<()> {
        if !(self.area_per_unit > 0.0) {
            return Err(CroftError::InvalidInput(format!(
                "crop {}: area_per_unit must be positive, got {}",
                self.id, self.area_per_unit
            )));
        }
        if let Some(r) = self.revenue_per_area {
            if r < 0.0 {
                return Err(CroftError::InvalidInput(format!(
                    "crop {}: revenue_per_area must be non-negative, got {}",
                    self.id, r
                )));
            }
        }
        if let Some(cap) = self.revenue_cap {
            if cap < 0.0 {
                return Err(CroftError::InvalidInput(format!(
                    "crop {}: revenue_cap must be non-negative, got {}",
                    self.id, cap
                )));
            }
        }
        Ok(())
    }
}

/// The kinds of temperature stress tracked per growth stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressType {
    HighTemp,
    LowTemp,
    Frost,
    Sterility,
}

impl StressType {
    pub const ALL: [StressType; 4] = [
        StressType::HighTemp,
        StressType::LowTemp,
        StressType::Frost,
        StressType::Sterility,
    ];

    /// Dense index for per-stage counters.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            StressType::HighTemp => 0,
            StressType::LowTemp => 1,
            StressType::Frost => 2,
            StressType::Sterility => 3,
        }
    }
}

impl fmt::Display for StressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StressType::HighTemp => "high_temp",
            StressType::LowTemp => "low_temp",
            StressType::Frost => "frost",
            StressType::Sterility => "sterility",
        };
        f.write_str(s)
    }
}

/// Per-stress daily yield impact coefficients.
///
/// Each stress day multiplies the yield factor by
/// `1 - impact * stage_sensitivity` (floored at zero), so these are the
/// per-day fractional penalties at full sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressImpacts {
    pub high_temp: f64,
    pub low_temp: f64,
    pub frost: f64,
    pub sterility: f64,
}

impl Default for StressImpacts {
    fn default() -> Self {
        StressImpacts {
            high_temp: 0.05,
            low_temp: 0.08,
            frost: 0.15,
            sterility: 0.20,
        }
    }
}

impl StressImpacts {
    #[inline]
    pub fn get(&self, stress: StressType) -> f64 {
        match stress {
            StressType::HighTemp => self.high_temp,
            StressType::LowTemp => self.low_temp,
            StressType::Frost => self.frost,
            StressType::Sterility => self.sterility,
        }
    }
}

/// Per-stage stress sensitivity coefficients in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressSensitivity {
    pub high_temp: f64,
    pub low_temp: f64,
    pub frost: f64,
    pub sterility: f64,
}

impl StressSensitivity {
    pub fn uniform(value: f64) -> Self {
        StressSensitivity {
            high_temp: value,
            low_temp: value,
            frost: value,
            sterility: value,
        }
    }

    /// Canonical defaults by stage name: reproductive stages are most
    /// sensitive, establishment and ripening least.
    pub fn for_stage_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("flower") {
            StressSensitivity::uniform(1.0)
        } else if lower.contains("heading") || lower.contains("grain") {
            StressSensitivity::uniform(0.9)
        } else if lower.contains("germination") || lower.contains("emergence") {
            StressSensitivity::uniform(0.3)
        } else if lower.contains("ripen") || lower.contains("matur") {
            StressSensitivity::uniform(0.2)
        } else {
            StressSensitivity::uniform(0.5)
        }
    }

    #[inline]
    pub fn get(&self, stress: StressType) -> f64 {
        match stress {
            StressType::HighTemp => self.high_temp,
            StressType::LowTemp => self.low_temp,
            StressType::Frost => self.frost,
            StressType::Sterility => self.sterility,
        }
    }

    pub fn validate(&self) -> CroftResult<()> {
        for stress in StressType::ALL {
            let v = self.get(stress);
            if !(0.0..=1.0).contains(&v) {
                return Err(CroftError::InvalidInput(format!(
                    "stress sensitivity for {} must be in [0, 1], got {}",
                    stress, v
                )));
            }
        }
        Ok(())
    }
}

/// Trapezoidal temperature response and stress thresholds for one stage.
///
/// Invariant: `base_t < optimal_min <= optimal_max < max_t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureProfile {
    /// Below this mean temperature no growth accrues.
    pub base_t: f64,
    /// Lower bound of the fully efficient band.
    pub optimal_min: f64,
    /// Upper bound of the fully efficient band.
    pub optimal_max: f64,
    /// Above this mean temperature no growth accrues.
    pub max_t: f64,
    /// Mean temperature below which a low-temperature stress day is tallied.
    pub low_stress_t: f64,
    /// Mean temperature above which a high-temperature stress day is tallied.
    pub high_stress_t: f64,
    /// Minimum temperature at or below which a frost day is tallied.
    pub frost_t: f64,
    /// Maximum temperature at or above which a sterility-risk day is
    /// tallied. Only checked when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sterility_risk_t: Option<f64>,
    /// Optional per-stress daily-impact overrides for this stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_overrides: Option<StressImpacts>,
}

impl TemperatureProfile {
    pub fn validate(&self) -> CroftResult<()> {
        let ok = self.base_t < self.optimal_min
            && self.optimal_min <= self.optimal_max
            && self.optimal_max < self.max_t;
        if !ok {
            return Err(CroftError::InvalidInput(format!(
                "invalid temperature profile: require base < optimal_min <= optimal_max < max, \
                 got base={} optimal_min={} optimal_max={} max={}",
                self.base_t, self.optimal_min, self.optimal_max, self.max_t
            )));
        }
        Ok(())
    }

    /// Daily impact coefficients for this stage (overrides or defaults).
    pub fn impacts(&self) -> StressImpacts {
        self.impact_overrides.unwrap_or_default()
    }
}

/// One growth stage: name, order, thermal requirement and sensitivities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRequirement {
    pub name: String,
    /// 1-based position in the stage sequence.
    pub order: u32,
    /// Accumulated GDD needed to complete this stage. Must be > 0.
    pub required_gdd: f64,
    pub profile: TemperatureProfile,
    /// Explicit sensitivity coefficients; when absent, canonical defaults
    /// derived from the stage name apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<StressSensitivity>,
}

impl StageRequirement {
    /// Effective sensitivity coefficients for this stage.
    pub fn sensitivity(&self) -> StressSensitivity {
        self.sensitivity
            .unwrap_or_else(|| StressSensitivity::for_stage_name(&self.name))
    }

    pub fn validate(&self) -> CroftResult<()> {
        if !(self.required_gdd > 0.0) {
            return Err(CroftError::InvalidInput(format!(
                "stage {}: required_gdd must be positive, got {}",
                self.name, self.required_gdd
            )));
        }
        self.profile.validate()?;
        if let Some(s) = self.sensitivity {
            s.validate()?;
        }
        Ok(())
    }
}

/// A crop plus its ordered thermal stage requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub crop: Crop,
    pub stages: Vec<StageRequirement>,
}

impl CropProfile {
    /// Total GDD the crop must accumulate from start to completion.
    pub fn total_required_gdd(&self) -> f64 {
        self.stages.iter().map(|s| s.required_gdd).sum()
    }

    /// Cumulative GDD thresholds at the end of each stage.
    pub fn stage_thresholds(&self) -> Vec<f64> {
        let mut acc = 0.0;
        self.stages
            .iter()
            .map(|s| {
                acc += s.required_gdd;
                acc
            })
            .collect()
    }

    /// Index of the stage active at `cumulative_gdd`.
    pub fn stage_at(&self, cumulative_gdd: f64) -> usize {
        let mut acc = 0.0;
        for (i, stage) in self.stages.iter().enumerate() {
            acc += stage.required_gdd;
            if cumulative_gdd < acc {
                return i;
            }
        }
        self.stages.len().saturating_sub(1)
    }

    /// Whether every stage shares one thermal profile. Enables the
    /// prefix-sum evaluation path in the period optimizer.
    pub fn uniform_thermal(&self) -> bool {
        match self.stages.split_first() {
            Some((first, rest)) => rest.iter().all(|s| s.profile == first.profile),
            None => true,
        }
    }

    pub fn validate(&self) -> CroftResult<()> {
        self.crop.validate()?;
        if self.stages.is_empty() {
            return Err(CroftError::InvalidInput(format!(
                "crop {}: profile has no stages",
                self.crop.id
            )));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            stage.validate()?;
            if stage.order as usize != i + 1 {
                return Err(CroftError::InvalidInput(format!(
                    "crop {}: stage {} has order {}, expected {}",
                    self.crop.id,
                    stage.name,
                    stage.order,
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> TemperatureProfile {
        TemperatureProfile {
            base_t: 10.0,
            optimal_min: 20.0,
            optimal_max: 28.0,
            max_t: 35.0,
            low_stress_t: 12.0,
            high_stress_t: 32.0,
            frost_t: 0.0,
            sterility_risk_t: None,
            impact_overrides: None,
        }
    }

    fn crop_profile() -> CropProfile {
        let stages = vec![
            StageRequirement {
                name: "germination".into(),
                order: 1,
                required_gdd: 120.0,
                profile: profile(),
                sensitivity: None,
            },
            StageRequirement {
                name: "flowering".into(),
                order: 2,
                required_gdd: 300.0,
                profile: profile(),
                sensitivity: None,
            },
        ];
        CropProfile {
            crop: Crop {
                id: CropId::new("tomato"),
                name: "Tomato".into(),
                variety: None,
                area_per_unit: 0.5,
                revenue_per_area: Some(100.0),
                revenue_cap: None,
                groups: vec!["Solanaceae".into()],
            },
            stages,
        }
    }

    #[test]
    fn test_profile_invariant() {
        assert!(profile().validate().is_ok());

        let mut bad = profile();
        bad.optimal_min = 10.0; // base == optimal_min
        assert!(bad.validate().is_err());

        let mut bad = profile();
        bad.max_t = 28.0; // optimal_max == max
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_total_gdd_and_thresholds() {
        let p = crop_profile();
        assert_eq!(p.total_required_gdd(), 420.0);
        assert_eq!(p.stage_thresholds(), vec![120.0, 420.0]);
        assert_eq!(p.stage_at(0.0), 0);
        assert_eq!(p.stage_at(119.9), 0);
        assert_eq!(p.stage_at(120.0), 1);
        assert_eq!(p.stage_at(500.0), 1);
    }

    #[test]
    fn test_stage_order_validated() {
        let mut p = crop_profile();
        p.stages[1].order = 3;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_default_sensitivities_by_stage_name() {
        let p = crop_profile();
        assert_eq!(p.stages[0].sensitivity().frost, 0.3);
        assert_eq!(p.stages[1].sensitivity().sterility, 1.0);
    }

    #[test]
    fn test_uniform_thermal_detection() {
        let mut p = crop_profile();
        assert!(p.uniform_thermal());
        p.stages[1].profile.base_t = 12.0;
        assert!(!p.uniform_thermal());
    }

    #[test]
    fn test_stress_type_wire_format() {
        let json = serde_json::to_string(&StressType::HighTemp).unwrap();
        assert_eq!(json, "\"high_temp\"");
    }
}
