use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reference::{ScoredReference, TargetReference};
use crate::selector::LabelSelector;

pub const DEFAULT_ADVISOR_WEIGHT: i16 = 100;
pub const DEFAULT_DECISION_WEIGHT: i16 = 100;
pub const DEFAULT_SCORE: i16 = 100;

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorType {
    Predicate,
    Priority,
    /// Anything the engine does not recognize; behaves as priority.
    #[serde(other)]
    Unknown,
}

/// An external recommender invited to participate in the decision cycle.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema)]
pub struct Advisor {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub advisor_type: Option<AdvisorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i16>,
    /// Opaque payload carried verbatim; each advisor parses its own format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Value>,
}

impl Advisor {
    /// Effective type. Absent and unrecognized types both count as priority.
    pub fn effective_type(&self) -> AdvisorType {
        match self.advisor_type {
            Some(AdvisorType::Predicate) => AdvisorType::Predicate,
            _ => AdvisorType::Priority,
        }
    }
}

/// The set of scored references one advisor published for the current cycle.
///
/// `deny` is the explicit "no candidates acceptable" marker. It replaces the
/// zero-uid sentinel reference of earlier revisions, which was
/// indistinguishable from a malformed reference.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ScoredReference>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deny: bool,
}

impl Recommendation {
    pub fn new(references: Vec<ScoredReference>) -> Self {
        Recommendation {
            references,
            deny: false,
        }
    }

    /// The marker recommendation rejecting every candidate.
    pub fn deny_all() -> Self {
        Recommendation {
            references: Vec::new(),
            deny: true,
        }
    }
}

/// Desired state: which targets are eligible, how many to pick, and which
/// advisors take part in narrowing them down.
#[derive(
    CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Default,
)]
#[kube(
    group = "placement.hybridops.io",
    version = "v1alpha1",
    kind = "PlacementRule",
    plural = "placementrules",
    namespaced,
    status = "PlacementRuleStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRuleSpec {
    /// Selects the target resource kind through the deployer catalog.
    /// Absent means the default kind configured at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployer_type: Option<String>,
    /// Allow-list of targets by name and/or namespace; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetReference>,
    /// Label selector applied server-side when listing targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_labels: Option<LabelSelector>,
    /// Preference bias for targets already present in `status.decisions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_weight: Option<i16>,
    /// How many targets to choose; absent means all candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisors: Vec<Advisor>,
}

/// Observed state, written only by the engine and the advisors.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRuleStatus {
    /// The spec generation the current cycle reflects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
    /// Targets still eligible in the ongoing cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<TargetReference>,
    /// Targets removed from the pool this cycle, kept for observability.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eliminators: Vec<TargetReference>,
    /// Latest recommendation per advisor name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recommendations: BTreeMap<String, Recommendation>,
    /// The chosen targets for the current cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<TargetReference>,
}
