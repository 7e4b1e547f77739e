//! Startup singleton lock: a coordination Lease claimed once and held for
//! the life of the process. Failover is re-election after the platform
//! releases the stale Lease.

use std::time::Duration;

use chrono::Utc;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{MicroTime, ObjectMeta};
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::info;

const RETRY_PERIOD: Duration = Duration::from_secs(5);

fn identity() -> String {
    std::env::var("HOSTNAME")
        .unwrap_or_else(|_| format!("placement-engine-{}", std::process::id()))
}

/// Block until this process holds the named Lease. Unrecoverable API errors
/// bubble up and abort startup.
pub async fn acquire(
    client: &Client,
    namespace: &str,
    lock_name: &str,
) -> anyhow::Result<()> {
    let api: Api<Lease> = Api::namespaced(client.clone(), namespace);
    let id = identity();

    loop {
        match api.get_opt(lock_name).await? {
            None => {
                let lease = Lease {
                    metadata: ObjectMeta {
                        name: Some(lock_name.to_string()),
                        ..Default::default()
                    },
                    spec: Some(LeaseSpec {
                        holder_identity: Some(id.clone()),
                        acquire_time: Some(MicroTime(Utc::now())),
                        ..Default::default()
                    }),
                };
                match api.create(&PostParams::default(), &lease).await {
                    Ok(_) => {
                        info!(%id, %lock_name, "acquired leader lock");
                        return Ok(());
                    }
                    Err(kube::Error::Api(ae)) if ae.code == 409 => {
                        // Lost the race; fall through and wait.
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Some(existing) => {
                let holder = existing
                    .spec
                    .as_ref()
                    .and_then(|s| s.holder_identity.clone())
                    .unwrap_or_default();
                if holder == id {
                    info!(%id, %lock_name, "already holding leader lock");
                    return Ok(());
                }
                info!(%holder, %lock_name, "leader lock held, waiting");
            }
        }
        tokio::time::sleep(RETRY_PERIOD).await;
    }
}
