//! Reference predicate advisor: rejects candidates named on a veto list
//! carried in the advisor's rules payload.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use placement_api::{
    Advisor, PlacementRule, Recommendation, ScoredReference, TargetReference,
};

use super::Recommender;

pub struct VetoAdvisor;

#[derive(Deserialize, Debug, Default)]
struct VetoRules {
    #[serde(default)]
    resources: Vec<VetoEntry>,
}

#[derive(Deserialize, Debug, Default)]
struct VetoEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

impl VetoEntry {
    /// Empty fields are wildcards, but an entirely empty entry matches
    /// nothing rather than everything.
    fn matches(&self, or: &TargetReference) -> bool {
        if self.name.is_empty() && self.namespace.is_empty() {
            return false;
        }
        if !self.name.is_empty() && self.name != or.name {
            return false;
        }
        if !self.namespace.is_empty() && self.namespace != or.namespace {
            return false;
        }
        true
    }
}

/// The payload is opaque JSON in the store; a string payload is additionally
/// accepted as inline YAML.
fn parse_rules(payload: &Value) -> Result<VetoRules, String> {
    match payload {
        Value::String(doc) => {
            serde_yaml::from_str(doc).map_err(|e| e.to_string())
        }
        other => {
            serde_json::from_value(other.clone()).map_err(|e| e.to_string())
        }
    }
}

impl Recommender for VetoAdvisor {
    fn name(&self) -> &'static str {
        "veto"
    }

    fn recommend(
        &self,
        rule: &PlacementRule,
        advisor: &Advisor,
    ) -> Recommendation {
        let candidates: Vec<TargetReference> = rule
            .status
            .as_ref()
            .map(|s| s.candidates.clone())
            .unwrap_or_default();

        let Some(payload) = advisor.rules.as_ref() else {
            return unfiltered(candidates);
        };

        let veto_rules = match parse_rules(payload) {
            Ok(rules) => rules,
            Err(e) => {
                // A broken payload must never stall the cycle; advise the
                // whole pool instead.
                warn!(error = %e, "failed to parse veto rules payload");
                return unfiltered(candidates);
            }
        };

        let kept: Vec<TargetReference> = candidates
            .into_iter()
            .filter(|or| {
                !veto_rules.resources.iter().any(|entry| entry.matches(or))
            })
            .collect();

        if kept.is_empty() {
            return Recommendation::deny_all();
        }
        unfiltered(kept)
    }
}

fn unfiltered(refs: Vec<TargetReference>) -> Recommendation {
    Recommendation::new(
        refs.into_iter().map(ScoredReference::unscored).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_api::{AdvisorType, PlacementRuleSpec, PlacementRuleStatus};
    use serde_json::json;

    fn target(name: &str, namespace: &str, uid: &str) -> TargetReference {
        TargetReference {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
            ..Default::default()
        }
    }

    fn rule_with(
        rules_payload: Option<Value>,
        candidates: Vec<TargetReference>,
    ) -> PlacementRule {
        let mut rule = PlacementRule::new(
            "test",
            PlacementRuleSpec {
                advisors: vec![Advisor {
                    name: "veto".into(),
                    advisor_type: Some(AdvisorType::Predicate),
                    weight: None,
                    rules: rules_payload,
                }],
                ..Default::default()
            },
        );
        rule.status = Some(PlacementRuleStatus {
            candidates,
            ..Default::default()
        });
        rule
    }

    fn recommend(rule: &PlacementRule) -> Recommendation {
        VetoAdvisor.recommend(rule, &rule.spec.advisors[0])
    }

    fn uids(rec: &Recommendation) -> Vec<&str> {
        rec.references
            .iter()
            .map(|sr| sr.reference.uid.as_str())
            .collect()
    }

    #[test]
    fn vetoes_by_name() {
        let rule = rule_with(
            Some(json!({"resources": [{"name": "mc2"}]})),
            vec![target("mc1", "", "u1"), target("mc2", "", "u2")],
        );
        let rec = recommend(&rule);
        assert_eq!(uids(&rec), vec!["u1"]);
    }

    #[test]
    fn vetoes_by_namespace_wildcard() {
        let rule = rule_with(
            Some(json!({"resources": [{"namespace": "edge"}]})),
            vec![target("mc1", "edge", "u1"), target("mc2", "hub", "u2")],
        );
        let rec = recommend(&rule);
        assert_eq!(uids(&rec), vec!["u2"]);
    }

    #[test]
    fn empty_entry_vetoes_nothing() {
        let rule = rule_with(
            Some(json!({"resources": [{}]})),
            vec![target("mc1", "", "u1")],
        );
        let rec = recommend(&rule);
        assert_eq!(uids(&rec), vec!["u1"]);
    }

    #[test]
    fn all_candidates_vetoed_means_deny() {
        let rule = rule_with(
            Some(json!({"resources": [{"name": "mc1"}]})),
            vec![target("mc1", "", "u1")],
        );
        let rec = recommend(&rule);
        assert!(rec.deny);
        assert!(rec.references.is_empty());
    }

    #[test]
    fn missing_payload_recommends_everything() {
        let rule =
            rule_with(None, vec![target("mc1", "", "u1")]);
        let rec = recommend(&rule);
        assert_eq!(uids(&rec), vec!["u1"]);
    }

    #[test]
    fn malformed_payload_recommends_everything() {
        let rule = rule_with(
            Some(json!({"resources": "not-a-list"})),
            vec![target("mc1", "", "u1")],
        );
        let rec = recommend(&rule);
        assert_eq!(uids(&rec), vec!["u1"]);
        assert!(!rec.deny);
    }

    #[test]
    fn string_payload_parses_as_yaml() {
        let rule = rule_with(
            Some(Value::String(
                "resources:\n  - name: mc1\n".to_string(),
            )),
            vec![target("mc1", "", "u1"), target("mc2", "", "u2")],
        );
        let rec = recommend(&rule);
        assert_eq!(uids(&rec), vec!["u2"]);
    }
}
