//! Candidate generation: list the live target objects of the resolved kind
//! and narrow them through the rule's filters.

use kube::api::{Api, ListParams};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;
use kube::Client;

use placement_api::{
    deployer_placement_target, PlacementRuleSpec, PlacementRuleStatus,
    TargetKind, TargetReference,
};

use crate::errors::Error;

/// Targets that must never become candidates, such as the hub's own
/// representation in the cluster inventory.
fn ignored_targets() -> Vec<TargetReference> {
    vec![TargetReference {
        api_version: "cluster.open-cluster-management.io/v1".into(),
        kind: "ManagedCluster".into(),
        namespace: String::new(),
        name: "local-cluster".into(),
        uid: String::new(),
    }]
}

fn api_resource(kind: &TargetKind) -> ApiResource {
    let gvk_kind = if kind.kind.is_empty() {
        &kind.resource
    } else {
        &kind.kind
    };
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(&kind.group, &kind.version, gvk_kind),
        &kind.resource,
    )
}

fn reference_for(obj: &DynamicObject, kind: &TargetKind) -> TargetReference {
    let (api_version, obj_kind) = match obj.types.as_ref() {
        Some(t) if !t.kind.is_empty() => {
            (t.api_version.clone(), t.kind.clone())
        }
        _ => (kind.api_version(), kind.kind.clone()),
    };
    TargetReference {
        api_version,
        kind: obj_kind,
        namespace: obj.metadata.namespace.clone().unwrap_or_default(),
        name: obj.metadata.name.clone().unwrap_or_default(),
        uid: obj.metadata.uid.clone().unwrap_or_default(),
    }
}

/// Whether a live object survives the rule's filters. Order matters: the
/// ignore list is a hard drop, the target list is an allow-list with
/// name/namespace wildcards, and rules aimed at the generic deployers kind
/// additionally require the object's own declared type to match.
fn admit(
    or: &TargetReference,
    obj: &DynamicObject,
    spec: &PlacementRuleSpec,
    is_deployers_kind: bool,
) -> bool {
    for ignored in ignored_targets() {
        if or.kind == ignored.kind
            && or.api_version == ignored.api_version
            && or.name == ignored.name
            && or.namespace == ignored.namespace
        {
            return false;
        }
    }

    if !spec.targets.is_empty() {
        let matched = spec.targets.iter().any(|t| {
            if t.name.is_empty() && t.namespace.is_empty() {
                return false;
            }
            if !t.name.is_empty() && t.name != or.name {
                return false;
            }
            if !t.namespace.is_empty() && t.namespace != or.namespace {
                return false;
            }
            true
        });
        if !matched {
            return false;
        }
    }

    if is_deployers_kind {
        if let Some(deployer_type) = spec.deployer_type.as_deref() {
            let declared = obj
                .data
                .get("spec")
                .and_then(|s| s.get("type"))
                .and_then(|t| t.as_str())
                .unwrap_or_default();
            if declared != deployer_type {
                return false;
            }
        }
    }

    true
}

/// Fix the traversal order for the cycle. Elimination tie-breaks depend on
/// it, so it must be total and stable across reconciles.
fn sort_candidates(candidates: &mut [TargetReference]) {
    candidates.sort_by(|a, b| {
        (&a.namespace, &a.name, &a.uid).cmp(&(&b.namespace, &b.name, &b.uid))
    });
}

/// List live objects of the resolved kind and return the admissible
/// candidates in traversal order. Listing errors bubble up; the reconcile is
/// retried on the next event.
pub async fn generate_candidates(
    client: &Client,
    spec: &PlacementRuleSpec,
    kind: &TargetKind,
) -> Result<Vec<TargetReference>, Error> {
    let mut lp = ListParams::default();
    if let Some(selector) = spec.target_labels.as_ref() {
        lp = lp.labels(&selector.to_selector()?);
    }

    let api: Api<DynamicObject> =
        Api::all_with(client.clone(), &api_resource(kind));
    let objects = api.list(&lp).await?;

    let is_deployers_kind = *kind == deployer_placement_target();
    let mut candidates = Vec::new();
    for obj in &objects.items {
        let or = reference_for(obj, kind);
        if admit(&or, obj, spec, is_deployers_kind) {
            candidates.push(or);
        }
    }

    sort_candidates(&mut candidates);
    Ok(candidates)
}

/// Whether the freshly generated candidates match the pool recorded in
/// status, i.e. candidates plus eliminators, by identity. A mismatch means
/// the world moved and the cycle must reset.
pub fn same_candidate_set(
    new_candidates: &[TargetReference],
    status: Option<&PlacementRuleStatus>,
) -> bool {
    use std::collections::HashSet;

    let mut pending: HashSet<&str> =
        new_candidates.iter().map(|or| or.key()).collect();

    let Some(status) = status else {
        return pending.is_empty();
    };

    for or in status.candidates.iter().chain(status.eliminators.iter()) {
        if !pending.remove(or.key()) {
            return false;
        }
    }

    pending.is_empty()
}
