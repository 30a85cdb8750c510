//! Interaction-rule evaluation: group-pair index and impact lookup.
//!
//! Rules are stored in an index keyed by (source_group, target_group).
//! Temporal classes match the immediately prior allocation's crop groups
//! on the same field; compatibility classes match the field's own group
//! tags. Multiple matching rules compound multiplicatively.

use croft_core::{InteractionRule, RuleType};
use std::collections::HashMap;

/// Prebuilt lookup over the instance's rules.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    temporal: HashMap<(String, String), Vec<f64>>,
    compat: HashMap<(String, String), Vec<f64>>,
}

impl RuleIndex {
    pub fn build(rules: &[InteractionRule]) -> Self {
        let mut index = RuleIndex::default();
        for rule in rules {
            let bucket = if rule.rule_type.is_temporal() {
                &mut index.temporal
            } else {
                &mut index.compat
            };
            bucket
                .entry((rule.source_group.clone(), rule.target_group.clone()))
                .or_default()
                .push(rule.impact_ratio);
            // Non-directional rules also match the swapped orientation;
            // a self-pair already covers both.
            if !rule.directional && rule.source_group != rule.target_group {
                bucket
                    .entry((rule.target_group.clone(), rule.source_group.clone()))
                    .or_default()
                    .push(rule.impact_ratio);
            }
        }
        index
    }

    /// Combined multiplier from the prior crop's groups onto the next
    /// crop's groups on the same field.
    pub fn temporal_impact(&self, prior_groups: &[String], next_groups: &[String]) -> f64 {
        combined(&self.temporal, prior_groups, next_groups)
    }

    /// Combined multiplier from the field's group tags onto a crop's
    /// groups (soil/climate compatibility).
    pub fn field_impact(&self, field_groups: &[String], crop_groups: &[String]) -> f64 {
        combined(&self.compat, field_groups, crop_groups)
    }

    pub fn is_empty(&self) -> bool {
        self.temporal.is_empty() && self.compat.is_empty()
    }
}

fn combined(
    index: &HashMap<(String, String), Vec<f64>>,
    sources: &[String],
    targets: &[String],
) -> f64 {
    if index.is_empty() {
        return 1.0;
    }
    let mut impact = 1.0;
    for source in sources {
        for target in targets {
            if let Some(ratios) = index.get(&(source.clone(), target.clone())) {
                for ratio in ratios {
                    impact *= ratio;
                }
            }
        }
    }
    impact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::rule;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_continuous_cropping_penalty() {
        let index = RuleIndex::build(&[rule(
            "r1",
            RuleType::ContinuousCultivation,
            "Solanaceae",
            "Solanaceae",
            0.5,
        )]);
        let solanaceae = groups(&["Solanaceae"]);
        let legume = groups(&["Fabaceae"]);
        assert_eq!(index.temporal_impact(&solanaceae, &solanaceae), 0.5);
        assert_eq!(index.temporal_impact(&solanaceae, &legume), 1.0);
        assert_eq!(index.temporal_impact(&legume, &solanaceae), 1.0);
    }

    #[test]
    fn test_directionality() {
        let mut beneficial = rule(
            "r2",
            RuleType::BeneficialRotation,
            "Fabaceae",
            "Poaceae",
            1.2,
        );
        beneficial.directional = false;
        let index = RuleIndex::build(&[beneficial]);
        let legume = groups(&["Fabaceae"]);
        let grass = groups(&["Poaceae"]);
        assert_eq!(index.temporal_impact(&legume, &grass), 1.2);
        // Non-directional: the reverse ordering matches too.
        assert_eq!(index.temporal_impact(&grass, &legume), 1.2);
    }

    #[test]
    fn test_multiple_rules_compound() {
        let index = RuleIndex::build(&[
            rule("r1", RuleType::ContinuousCultivation, "a", "b", 0.5),
            rule("r2", RuleType::Allelopathy, "a", "b", 0.8),
        ]);
        let impact = index.temporal_impact(&groups(&["a"]), &groups(&["b"]));
        assert!((impact - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_field_compatibility_is_separate() {
        let index = RuleIndex::build(&[rule(
            "r1",
            RuleType::SoilCompatibility,
            "acidic_soil",
            "Ericaceae",
            1.3,
        )]);
        let field = groups(&["acidic_soil"]);
        let crop = groups(&["Ericaceae"]);
        assert_eq!(index.field_impact(&field, &crop), 1.3);
        // A soil rule never fires on the temporal path.
        assert_eq!(index.temporal_impact(&field, &crop), 1.0);
    }

    #[test]
    fn test_no_rules_means_unity() {
        let index = RuleIndex::default();
        assert_eq!(index.temporal_impact(&groups(&["x"]), &groups(&["y"])), 1.0);
    }
}
