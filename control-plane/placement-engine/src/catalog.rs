//! Resolution of a rule's deployer type to the concrete target kind.

use kube::api::{Api, ListParams};
use kube::Client;
use tracing::debug;

use placement_api::{
    deployer_placement_target, Deployer, PlacementRuleSpec, TargetKind,
};

use crate::errors::Error;

/// Parse a `resource.version.group` string into a target kind. The group may
/// itself contain dots; the first two segments are resource and version.
pub fn parse_target(s: &str) -> Option<TargetKind> {
    let mut parts = s.splitn(3, '.');
    let resource = parts.next().filter(|p| !p.is_empty())?;
    let version = parts.next().filter(|p| !p.is_empty())?;
    let group = parts.next().unwrap_or("");
    Some(TargetKind {
        group: group.to_string(),
        version: version.to_string(),
        resource: resource.to_string(),
        kind: String::new(),
    })
}

/// Resolve the target kind for a rule.
///
/// Without a deployer type the configured default applies. Otherwise the
/// deployer catalog is consulted: a matching deployer either names its own
/// placement target or the rule targets deployer objects themselves.
/// `Ok(None)` means the type is unknown; the cycle defers with an empty
/// candidate pool until a matching deployer appears.
pub async fn resolve_target_kind(
    client: &Client,
    spec: &PlacementRuleSpec,
    default_target: &TargetKind,
) -> Result<Option<TargetKind>, Error> {
    let Some(deployer_type) = spec.deployer_type.as_deref() else {
        return Ok(Some(default_target.clone()));
    };

    let api: Api<Deployer> = Api::all(client.clone());
    let deployers = api.list(&ListParams::default()).await?;

    for dply in deployers.items {
        if dply.spec.deployer_type == deployer_type {
            return Ok(Some(
                dply.spec
                    .placement_target
                    .unwrap_or_else(deployer_placement_target),
            ));
        }
    }

    debug!(%deployer_type, "no deployer matches the requested type");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_target_splits_resource_version_group() {
        let kind = parse_target(
            "managedclusters.v1.cluster.open-cluster-management.io",
        )
        .unwrap();
        assert_eq!(kind.resource, "managedclusters");
        assert_eq!(kind.version, "v1");
        assert_eq!(kind.group, "cluster.open-cluster-management.io");
    }

    #[test]
    fn parse_target_allows_core_group() {
        let kind = parse_target("nodes.v1").unwrap();
        assert_eq!(kind.resource, "nodes");
        assert_eq!(kind.version, "v1");
        assert_eq!(kind.group, "");
        assert_eq!(kind.api_version(), "v1");
    }

    #[test]
    fn parse_target_rejects_missing_version() {
        assert!(parse_target("managedclusters").is_none());
        assert!(parse_target("").is_none());
    }
}
