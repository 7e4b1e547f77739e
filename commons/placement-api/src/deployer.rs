use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const API_GROUP: &str = "placement.hybridops.io";
pub const DEFAULT_DEPLOYER_TYPE: &str = "kubernetes";

/// Concrete resource kind a placement rule selects its targets from.
#[derive(
    Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq, Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TargetKind {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    pub version: String,
    /// Plural resource name used on the list path.
    pub resource: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl TargetKind {
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// The kind targeted when `deployerType` is absent: managed clusters.
pub fn default_placement_target() -> TargetKind {
    TargetKind {
        group: "cluster.open-cluster-management.io".into(),
        version: "v1".into(),
        resource: "managedclusters".into(),
        kind: "ManagedCluster".into(),
    }
}

/// The kind targeted when a matched deployer declares no placement target:
/// the rule places onto deployer objects themselves.
pub fn deployer_placement_target() -> TargetKind {
    TargetKind {
        group: API_GROUP.into(),
        version: "v1alpha1".into(),
        resource: "deployers".into(),
        kind: "Deployer".into(),
    }
}

/// A Deployer names a deployer type and, optionally, the resource kind that
/// placement rules of that type should pick targets from.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "placement.hybridops.io",
    version = "v1alpha1",
    kind = "Deployer",
    plural = "deployers",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct DeployerSpec {
    #[serde(rename = "type")]
    pub deployer_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_target: Option<TargetKind>,
}
