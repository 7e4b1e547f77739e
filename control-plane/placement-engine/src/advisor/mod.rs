//! Advisor adapters: independent reconcilers that watch placement rules,
//! compute a recommendation when invited, and publish it through status.
//! They never touch candidates, decisions, or the observed generation.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use kube::api::{Api, PostParams};
use kube::runtime::controller::Action;
use kube::runtime::{watcher, Controller};
use kube::{Client, ResourceExt};
use tracing::{debug, error, info};

use placement_api::registry;
use placement_api::{Advisor, PlacementRule, Recommendation};

use crate::controller::rules_api;
use crate::errors::Error;

pub mod alphabet;
pub mod veto;

/// One pluggable recommender. `recommend` is pure; the runner handles the
/// invitation contract and the status write.
pub trait Recommender: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn recommend(
        &self,
        rule: &PlacementRule,
        advisor: &Advisor,
    ) -> Recommendation;
}

struct AdvisorContext<R> {
    client: Client,
    namespaces: Vec<String>,
    recommender: R,
}

impl<R> AdvisorContext<R> {
    fn watched(&self, namespace: &str) -> bool {
        self.namespaces.len() < 2
            || self.namespaces.iter().any(|ns| ns == namespace)
    }
}

/// Run one advisor's reconciler until the stream ends.
pub async fn run_advisor<R: Recommender>(
    client: Client,
    namespaces: Vec<String>,
    recommender: R,
) -> anyhow::Result<()> {
    let rules = rules_api(&client, &namespaces);
    let name = recommender.name();
    let ctx = Arc::new(AdvisorContext {
        client,
        namespaces,
        recommender,
    });

    Controller::new(rules, watcher::Config::default())
        .run(advise, advisor_error_policy, ctx)
        .for_each(move |res| async move {
            if let Err(e) = res {
                error!(advisor = name, error = ?e, "advisor reconcile error");
            }
        })
        .await;

    Ok(())
}

async fn advise<R: Recommender>(
    obj: Arc<PlacementRule>,
    ctx: Arc<AdvisorContext<R>>,
) -> Result<Action, Error> {
    let name = ctx.recommender.name();

    if !ctx.watched(&obj.namespace().unwrap_or_default()) {
        return Ok(Action::await_change());
    }

    // Not invited, or the engine has not caught up with the live spec yet.
    let Some(advisor) = registry::invited(&obj, name) else {
        return Ok(Action::await_change());
    };
    // One recommendation per cycle; the engine clears the map whenever it
    // reduces the pool.
    if registry::has_recommendation(&obj, name) {
        return Ok(Action::await_change());
    }

    let rec = ctx.recommender.recommend(&obj, advisor);
    debug!(
        advisor = name,
        rule = %obj.name_any(),
        refs = rec.references.len(),
        deny = rec.deny,
        "computed recommendation"
    );

    // Always persist the first computation, even a legitimately empty set;
    // the entry itself is what marks this advisor as done for the cycle.
    let mut rule = (*obj).clone();
    registry::set_recommendation(&mut rule, name, rec);
    let ns = rule.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<PlacementRule> = Api::namespaced(ctx.client.clone(), &ns);
    api.replace_status(
        &rule.name_any(),
        &PostParams::default(),
        serde_json::to_vec(&rule)?,
    )
    .await?;
    info!(advisor = name, rule = %rule.name_any(), "published recommendation");

    Ok(Action::await_change())
}

fn advisor_error_policy<R: Recommender>(
    _obj: Arc<PlacementRule>,
    error: &Error,
    ctx: Arc<AdvisorContext<R>>,
) -> Action {
    error!(advisor = ctx.recommender.name(), %error, "advisor failed, requeueing");
    Action::requeue(Duration::from_secs(15))
}
