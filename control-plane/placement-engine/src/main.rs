use std::net::SocketAddr;

use envconfig::Envconfig;
use kube::Client;
use tokio::try_join;
use tracing::info;

use placement_engine::advisor::{
    alphabet::AlphabetAdvisor, run_advisor, veto::VetoAdvisor,
};
use placement_engine::config::EngineConfig;
use placement_engine::controller::run_controller;
use placement_engine::metrics::EngineMetrics;
use placement_engine::{init_tracing, leader, web};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let cfg = EngineConfig::init_from_env()?;
    info!(?cfg, "starting placement engine");

    let client = Client::try_default().await?;

    if cfg.features.leader_election {
        leader::acquire(&client, &cfg.lock_namespace, &cfg.leader_lock_name)
            .await?;
    }

    let metrics = EngineMetrics::new(prometheus::default_registry())?;
    let metrics_addr: SocketAddr = cfg.metrics_bind.parse()?;

    let engine = tokio::spawn(run_controller(
        client.clone(),
        cfg.clone(),
        metrics.clone(),
    ));
    let alphabet = tokio::spawn(run_advisor(
        client.clone(),
        cfg.namespaces(),
        AlphabetAdvisor,
    ));
    let veto =
        tokio::spawn(run_advisor(client.clone(), cfg.namespaces(), VetoAdvisor));
    let http = tokio::spawn(web::run_http_server(metrics_addr));

    tokio::select! {
        res = async { try_join!(engine, alphabet, veto, http) } => {
            let (e, a, v, h) = res?;
            e?;
            a?;
            v?;
            h?;
        }
        _ = shutdown_signal() => {
            info!("signal received, shutting down");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        )
        .expect("failed to install signal handler")
        .recv()
        .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
