//! View helpers over a rule's advisor roster and published recommendations.
//!
//! All comparisons are set-wise on reference identity (uid); publication
//! order never matters.

use std::collections::HashSet;

use crate::placement_rule::{
    Advisor, PlacementRule, PlacementRuleStatus, Recommendation,
};
use crate::reference::TargetReference;

/// Look up an advisor by name, case-insensitively. Advisors only advise the
/// current generation, so this returns `None` until the engine has observed
/// the live spec.
pub fn invited<'a>(
    rule: &'a PlacementRule,
    name: &str,
) -> Option<&'a Advisor> {
    if name.is_empty() {
        return None;
    }
    let observed = rule.status.as_ref()?.observed_generation?;
    if Some(observed) != rule.metadata.generation {
        return None;
    }
    rule.spec
        .advisors
        .iter()
        .find(|adv| adv.name.eq_ignore_ascii_case(name))
}

/// Case-insensitive recommendation lookup. Advisors publish under their
/// canonical name while the spec may carry any casing, so every lookup by a
/// spec-side name goes through here.
pub fn recommendation_for<'a>(
    status: &'a PlacementRuleStatus,
    name: &str,
) -> Option<&'a Recommendation> {
    status
        .recommendations
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, rec)| rec)
}

pub fn has_recommendation(rule: &PlacementRule, name: &str) -> bool {
    rule.status
        .as_ref()
        .and_then(|s| recommendation_for(s, name))
        .is_some()
}

/// True when every advisor named in the spec has published for this cycle.
pub fn ready(rule: &PlacementRule) -> bool {
    rule.spec.advisors.iter().all(|adv| {
        rule.status
            .as_ref()
            .and_then(|s| recommendation_for(s, &adv.name))
            .is_some()
    })
}

pub fn set_recommendation(
    rule: &mut PlacementRule,
    name: &str,
    rec: Recommendation,
) {
    let status = rule
        .status
        .get_or_insert_with(PlacementRuleStatus::default);
    status.recommendations.insert(name.to_string(), rec);
}

pub fn same_recommendation(
    rule: &PlacementRule,
    name: &str,
    rec: &Recommendation,
) -> bool {
    match rule.status.as_ref().and_then(|s| recommendation_for(s, name)) {
        Some(existing) => equal_recommendations(existing, rec),
        None => rec.references.is_empty() && !rec.deny,
    }
}

pub fn equal_recommendations(a: &Recommendation, b: &Recommendation) -> bool {
    if a.deny != b.deny {
        return false;
    }
    if a.references.len() != b.references.len() {
        return false;
    }
    let keys: HashSet<&str> = a
        .references
        .iter()
        .map(|sr| sr.reference.key())
        .collect();
    b.references
        .iter()
        .all(|sr| keys.contains(sr.reference.key()))
}

pub fn equal_decisions(a: &[TargetReference], b: &[TargetReference]) -> bool {
    if a.is_empty() && b.is_empty() {
        return true;
    }
    if a.len() != b.len() {
        return false;
    }
    let keys: HashSet<&str> = a.iter().map(|or| or.key()).collect();
    b.iter().all(|or| keys.contains(or.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement_rule::{AdvisorType, PlacementRuleSpec};
    use crate::reference::ScoredReference;

    fn target(name: &str, uid: &str) -> TargetReference {
        TargetReference {
            name: name.into(),
            uid: uid.into(),
            ..Default::default()
        }
    }

    fn rule_with_advisor(name: &str) -> PlacementRule {
        let mut rule = PlacementRule::new(
            "test",
            PlacementRuleSpec {
                advisors: vec![Advisor {
                    name: name.into(),
                    advisor_type: Some(AdvisorType::Priority),
                    weight: None,
                    rules: None,
                }],
                ..Default::default()
            },
        );
        rule.metadata.generation = Some(3);
        rule.status = Some(PlacementRuleStatus {
            observed_generation: Some(3),
            ..Default::default()
        });
        rule
    }

    #[test]
    fn invited_matches_case_insensitively() {
        let rule = rule_with_advisor("Alphabet");
        assert!(invited(&rule, "alphabet").is_some());
        assert!(invited(&rule, "ALPHABET").is_some());
        assert!(invited(&rule, "veto").is_none());
    }

    #[test]
    fn invited_requires_current_generation() {
        let mut rule = rule_with_advisor("alphabet");
        rule.metadata.generation = Some(4);
        assert!(invited(&rule, "alphabet").is_none());
    }

    #[test]
    fn invited_requires_observed_status() {
        let mut rule = rule_with_advisor("alphabet");
        rule.status = None;
        assert!(invited(&rule, "alphabet").is_none());
    }

    #[test]
    fn ready_tracks_published_entries() {
        let mut rule = rule_with_advisor("alphabet");
        assert!(!ready(&rule));
        set_recommendation(
            &mut rule,
            "alphabet",
            Recommendation::new(vec![ScoredReference::unscored(target(
                "mc1", "u1",
            ))]),
        );
        assert!(ready(&rule));
        assert!(has_recommendation(&rule, "alphabet"));
    }

    #[test]
    fn ready_and_lookup_are_case_insensitive() {
        let mut rule = rule_with_advisor("Alphabet");
        // The adapter publishes under its canonical lowercase name.
        set_recommendation(
            &mut rule,
            "alphabet",
            Recommendation::default(),
        );
        assert!(ready(&rule));
        assert!(has_recommendation(&rule, "ALPHABET"));
        assert!(recommendation_for(
            rule.status.as_ref().unwrap(),
            "Alphabet"
        )
        .is_some());
    }

    #[test]
    fn equal_recommendations_ignores_order_and_scores() {
        let a = Recommendation::new(vec![
            ScoredReference {
                reference: target("mc1", "u1"),
                score: Some(40),
            },
            ScoredReference::unscored(target("mc2", "u2")),
        ]);
        let b = Recommendation::new(vec![
            ScoredReference::unscored(target("mc2", "u2")),
            ScoredReference::unscored(target("mc1", "u1")),
        ]);
        assert!(equal_recommendations(&a, &b));
    }

    #[test]
    fn same_recommendation_compares_against_stored_entry() {
        let mut rule = rule_with_advisor("alphabet");
        let rec = Recommendation::new(vec![ScoredReference::unscored(
            target("mc1", "u1"),
        )]);
        assert!(!same_recommendation(&rule, "alphabet", &rec));
        set_recommendation(&mut rule, "alphabet", rec.clone());
        assert!(same_recommendation(&rule, "alphabet", &rec));
        assert!(same_recommendation(&rule, "ALPHABET", &rec));
    }

    #[test]
    fn deny_marker_breaks_equality() {
        let a = Recommendation::deny_all();
        let b = Recommendation::default();
        assert!(!equal_recommendations(&a, &b));
        assert!(equal_recommendations(&a, &Recommendation::deny_all()));
    }

    #[test]
    fn equal_decisions_is_set_wise_on_uid() {
        let a = vec![target("mc1", "u1"), target("mc2", "u2")];
        let b = vec![target("renamed", "u2"), target("mc1", "u1")];
        assert!(equal_decisions(&a, &b));
        assert!(!equal_decisions(&a, &a[..1]));
        assert!(equal_decisions(&[], &[]));
    }
}
