use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::runtime::{watcher, Controller, WatchStreamExt};
use kube::Client;
use tracing::{debug, error};

use placement_api::{Deployer, PlacementRule, TargetKind};

use crate::catalog;
use crate::config::EngineConfig;
use crate::errors::Error;
use crate::metrics::EngineMetrics;

mod reconcile;
pub use reconcile::reconcile;

#[derive(Clone)]
pub struct ControllerContext {
    pub client: Client,
    pub namespaces: Vec<String>,
    pub default_target: TargetKind,
    pub metrics: EngineMetrics,
}

impl ControllerContext {
    /// Multi-namespace watches fall back to a cluster-wide stream; rules
    /// outside the configured set are skipped here.
    pub fn watched(&self, namespace: &str) -> bool {
        self.namespaces.len() < 2
            || self.namespaces.iter().any(|ns| ns == namespace)
    }
}

pub fn rules_api(client: &Client, namespaces: &[String]) -> Api<PlacementRule> {
    match namespaces {
        [ns] => Api::namespaced(client.clone(), ns),
        _ => Api::all(client.clone()),
    }
}

/// Run the decision-engine controller until the stream ends.
///
/// Deployer events retrigger every rule: a new or changed deployer can flip
/// the target kind a rule resolves to.
pub async fn run_controller(
    client: Client,
    cfg: EngineConfig,
    metrics: EngineMetrics,
) -> anyhow::Result<()> {
    let default_target = resolve_default_target(&cfg)?;
    let namespaces = cfg.namespaces();
    let rules = rules_api(&client, &namespaces);

    // Deployer changes are forwarded as a coalescing trigger; a full buffer
    // just drops the extra nudge.
    let deployers: Api<Deployer> = Api::all(client.clone());
    let (tx, deployer_events) = futures_channel::mpsc::channel::<()>(16);
    tokio::spawn(async move {
        let mut events = watcher(deployers, watcher::Config::default())
            .default_backoff()
            .touched_objects()
            .boxed();
        let mut tx = tx;
        while let Some(ev) = events.next().await {
            if ev.is_ok() {
                let _ = tx.try_send(());
            }
        }
    });

    let ctx = Arc::new(ControllerContext {
        client,
        namespaces,
        default_target,
        metrics,
    });

    Controller::new(rules, watcher::Config::default())
        .reconcile_all_on(deployer_events)
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => {
                    debug!(rule = %obj.name, "reconciled: requeue={:?}", action)
                }
                Err(e) => error!(error = ?e, "reconcile error"),
            }
        })
        .await;

    Ok(())
}

fn resolve_default_target(cfg: &EngineConfig) -> anyhow::Result<TargetKind> {
    let parsed = catalog::parse_target(&cfg.default_target).ok_or_else(|| {
        anyhow::anyhow!(
            "invalid PLACEMENT_DEFAULT_TARGET: {}",
            cfg.default_target
        )
    })?;
    // The built-in default carries its kind; a configured override lists
    // fine without one.
    let builtin = placement_api::default_placement_target();
    if parsed.group == builtin.group
        && parsed.version == builtin.version
        && parsed.resource == builtin.resource
    {
        Ok(builtin)
    } else {
        Ok(parsed)
    }
}

fn error_policy(
    _obj: Arc<PlacementRule>,
    error: &Error,
    ctx: Arc<ControllerContext>,
) -> Action {
    ctx.metrics.errors_total.inc();
    error!(%error, "reconcile failed, requeueing");
    Action::requeue(Duration::from_secs(15))
}
