//! Reference priority advisor: prefers candidates that sort first by name.

use placement_api::{
    Advisor, PlacementRule, Recommendation, ScoredReference, TargetReference,
};

use super::Recommender;

pub struct AlphabetAdvisor;

impl Recommender for AlphabetAdvisor {
    fn name(&self) -> &'static str {
        "alphabet"
    }

    fn recommend(
        &self,
        rule: &PlacementRule,
        _advisor: &Advisor,
    ) -> Recommendation {
        let mut refs: Vec<TargetReference> = rule
            .status
            .as_ref()
            .map(|s| s.candidates.clone())
            .unwrap_or_default();

        refs.sort_by(|a, b| {
            (&a.name, &a.namespace).cmp(&(&b.name, &b.namespace))
        });

        if let Some(replicas) = rule.spec.replicas {
            let cap = replicas.max(0) as usize;
            if cap < refs.len() {
                refs.truncate(cap);
            }
        }

        Recommendation::new(
            refs.into_iter().map(ScoredReference::unscored).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_api::{AdvisorType, PlacementRuleSpec, PlacementRuleStatus};

    fn target(name: &str, namespace: &str, uid: &str) -> TargetReference {
        TargetReference {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
            ..Default::default()
        }
    }

    fn rule_with_candidates(
        replicas: Option<i16>,
        candidates: Vec<TargetReference>,
    ) -> PlacementRule {
        let mut rule = PlacementRule::new(
            "test",
            PlacementRuleSpec {
                replicas,
                advisors: vec![Advisor {
                    name: "alphabet".into(),
                    advisor_type: Some(AdvisorType::Priority),
                    weight: None,
                    rules: None,
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

    #[test]
    fn recommends_in_name_then_namespace_order() {
        let rule = rule_with_candidates(
            None,
            vec![
                target("mcb", "ns2", "u1"),
                target("mca", "ns9", "u2"),
                target("mcb", "ns1", "u3"),
            ],
        );
        let rec = AlphabetAdvisor.recommend(&rule, &rule.spec.advisors[0]);
        let uids: Vec<&str> = rec
            .references
            .iter()
            .map(|sr| sr.reference.uid.as_str())
            .collect();
        assert_eq!(uids, vec!["u2", "u3", "u1"]);
        assert!(!rec.deny);
    }

    #[test]
    fn truncates_to_replica_count() {
        let rule = rule_with_candidates(
            Some(1),
            vec![target("mc2", "", "u2"), target("mc1", "", "u1")],
        );
        let rec = AlphabetAdvisor.recommend(&rule, &rule.spec.advisors[0]);
        assert_eq!(rec.references.len(), 1);
        assert_eq!(rec.references[0].reference.uid, "u1");
    }

    #[test]
    fn empty_pool_yields_empty_recommendation() {
        let rule = rule_with_candidates(Some(2), vec![]);
        let rec = AlphabetAdvisor.recommend(&rule, &rule.spec.advisors[0]);
        assert!(rec.references.is_empty());
        assert!(!rec.deny);
    }
}
