//! Interaction rules: group-to-group revenue multipliers.
//!
//! Rules express that a member of `source_group` preceding (temporal
//! classes) or hosting (field-compatibility classes) a member of
//! `target_group` multiplies the latter's revenue by `impact_ratio`.
//! Matching is by group-name lookup keys only; there are no object links
//! between crops, fields and rules.

use crate::{CroftError, CroftResult, RuleId};
use serde::{Deserialize, Serialize};

/// Closed set of rule classes. Unknown tags are rejected when a source is
/// decoded, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    ContinuousCultivation,
    BeneficialRotation,
    CompanionPlanting,
    Allelopathy,
    SoilCompatibility,
    ClimateCompatibility,
}

impl RuleType {
    /// Temporal rules match the immediately prior allocation's crop groups
    /// on the same field; the rest match the field's own group tags.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            RuleType::ContinuousCultivation
                | RuleType::BeneficialRotation
                | RuleType::CompanionPlanting
                | RuleType::Allelopathy
        )
    }
}

/// A single interaction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub id: RuleId,
    pub rule_type: RuleType,
    pub source_group: String,
    pub target_group: String,
    /// Revenue multiplier; 1.0 means no effect, < 1 penalty, > 1 benefit.
    pub impact_ratio: f64,
    /// When false the rule also matches with source and target swapped.
    #[serde(default = "default_directional")]
    pub directional: bool,
}

fn default_directional() -> bool {
    true
}

impl InteractionRule {
    pub fn validate(&self) -> CroftResult<()> {
        if !(self.impact_ratio > 0.0) {
            return Err(CroftError::InvalidInput(format!(
                "rule {}: impact_ratio must be positive, got {}",
                self.id, self.impact_ratio
            )));
        }
        if self.source_group.is_empty() || self.target_group.is_empty() {
            return Err(CroftError::InvalidInput(format!(
                "rule {}: source and target groups must be non-empty",
                self.id
            )));
        }
        Ok(())
    }
}
