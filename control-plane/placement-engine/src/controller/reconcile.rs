use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kube::api::{Api, PostParams};
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use tracing::{debug, info, instrument};

use placement_api::registry;
use placement_api::PlacementRule;

use crate::candidate;
use crate::catalog;
use crate::engine;
use crate::errors::Error;

use super::ControllerContext;

/// Membership changes in the target pool arrive as plain list drift, not as
/// rule events; a periodic requeue picks them up.
const REQUEUE_PERIOD: Duration = Duration::from_secs(60);

/// One convergence step for one rule: regenerate candidates, reset the cycle
/// when the pool or the spec moved, otherwise advance the state machine.
#[instrument(skip_all, fields(
    ns = %obj.namespace().unwrap_or_default(),
    name = %obj.name_any(),
))]
pub async fn reconcile(
    obj: Arc<PlacementRule>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, Error> {
    let ns = obj.namespace().unwrap_or_else(|| "default".to_string());
    let name = obj.name_any();

    if !ctx.watched(&ns) {
        return Ok(Action::await_change());
    }
    // Deletion is propagated by the platform; there are no children to
    // clean up.
    if obj.meta().deletion_timestamp.is_some() {
        return Ok(Action::await_change());
    }

    ctx.metrics.reconciles_total.inc();

    let target = catalog::resolve_target_kind(
        &ctx.client,
        &obj.spec,
        &ctx.default_target,
    )
    .await?;
    let candidates = match target {
        Some(kind) => {
            candidate::generate_candidates(&ctx.client, &obj.spec, &kind)
                .await?
        }
        // Unknown deployer type: defer with an empty pool until a matching
        // deployer shows up.
        None => Vec::new(),
    };

    let mut rule = (*obj).clone();
    let generation_changed = rule
        .status
        .as_ref()
        .and_then(|s| s.observed_generation)
        != rule.meta().generation;

    if generation_changed
        || !candidate::same_candidate_set(&candidates, rule.status.as_ref())
    {
        info!(count = candidates.len(), "installing fresh candidate pool");
        engine::reset(&mut rule, candidates);
        persist_status(&ctx, &ns, &name, &rule).await?;
        ctx.metrics.resets_total.inc();
        return Ok(Action::requeue(REQUEUE_PERIOD));
    }

    if !registry::ready(&rule) {
        debug!("waiting for advisors to publish");
        return Ok(Action::requeue(REQUEUE_PERIOD));
    }

    if engine::step(&mut rule) {
        if let Some(status) = rule.status.as_mut() {
            status.last_update_time = Some(Utc::now().to_rfc3339());
        }
        persist_status(&ctx, &ns, &name, &rule).await?;
        ctx.metrics.steps_total.inc();
        debug!("decision step persisted");
    }

    Ok(Action::requeue(REQUEUE_PERIOD))
}

/// Full status replace. The carried resourceVersion makes this an optimistic
/// write: a conflicting writer wins and the loser requeues.
async fn persist_status(
    ctx: &ControllerContext,
    ns: &str,
    name: &str,
    rule: &PlacementRule,
) -> Result<(), Error> {
    let api: Api<PlacementRule> = Api::namespaced(ctx.client.clone(), ns);
    api.replace_status(
        name,
        &PostParams::default(),
        serde_json::to_vec(rule)?,
    )
    .await?;
    Ok(())
}
