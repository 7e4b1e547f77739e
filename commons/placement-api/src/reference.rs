use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A reference to a live target object (cluster, deployer, ...).
///
/// Identity is carried by `uid` alone; the remaining fields are descriptive
/// and may go stale without affecting set comparisons.
#[derive(
    Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq, Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TargetReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

impl TargetReference {
    /// The stable identity key used for all set-wise comparisons.
    pub fn key(&self) -> &str {
        &self.uid
    }
}

/// A target reference as published by an advisor, with an optional affinity
/// score in `[0, 100]`. An absent score counts as 100.
#[derive(
    Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq, Eq,
)]
pub struct ScoredReference {
    #[serde(flatten)]
    pub reference: TargetReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i16>,
}

impl ScoredReference {
    pub fn unscored(reference: TargetReference) -> Self {
        ScoredReference {
            reference,
            score: None,
        }
    }
}
