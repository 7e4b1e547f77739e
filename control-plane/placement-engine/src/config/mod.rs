use envconfig::Envconfig;

/// Process configuration, read once at startup.
#[derive(Envconfig, Clone, Debug)]
pub struct EngineConfig {
    /// Comma-separated namespaces to watch; empty means cluster-wide.
    /// Env: PLACEMENT_WATCH_NAMESPACE (required)
    #[envconfig(from = "PLACEMENT_WATCH_NAMESPACE")]
    pub watch_namespace: String,

    /// host:port serving /metrics and /healthz.
    #[envconfig(from = "PLACEMENT_METRICS_BIND", default = "0.0.0.0:38383")]
    pub metrics_bind: String,

    /// Lease name for the process-wide singleton lock.
    #[envconfig(
        from = "PLACEMENT_LEADER_LOCK_NAME",
        default = "placement-engine-lock"
    )]
    pub leader_lock_name: String,

    /// Namespace holding the leader Lease.
    #[envconfig(from = "PLACEMENT_LOCK_NAMESPACE", default = "default")]
    pub lock_namespace: String,

    /// Default target kind as `resource.version.group`, used when a rule
    /// does not name a deployer type.
    #[envconfig(
        from = "PLACEMENT_DEFAULT_TARGET",
        default = "managedclusters.v1.cluster.open-cluster-management.io"
    )]
    pub default_target: String,

    #[envconfig(nested)]
    pub features: FeaturesConfig,
}

#[derive(Envconfig, Clone, Debug, Default)]
pub struct FeaturesConfig {
    /// Disable to run without the singleton lock (local development).
    /// Env: PLACEMENT_FEATURES_LEADER_ELECTION
    #[envconfig(from = "PLACEMENT_FEATURES_LEADER_ELECTION", default = "true")]
    pub leader_election: bool,
}

impl EngineConfig {
    /// The watched namespaces; empty when running cluster-wide.
    pub fn namespaces(&self) -> Vec<String> {
        self.watch_namespace
            .split(',')
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_namespace(ns: &str) -> EngineConfig {
        EngineConfig {
            watch_namespace: ns.into(),
            metrics_bind: "0.0.0.0:38383".into(),
            leader_lock_name: "placement-engine-lock".into(),
            lock_namespace: "default".into(),
            default_target:
                "managedclusters.v1.cluster.open-cluster-management.io".into(),
            features: FeaturesConfig::default(),
        }
    }

    #[test]
    fn empty_watch_namespace_means_cluster_wide() {
        assert!(config_with_namespace("").namespaces().is_empty());
    }

    #[test]
    fn namespaces_split_on_comma_and_trim() {
        let cfg = config_with_namespace("hub, edge-a ,edge-b");
        assert_eq!(cfg.namespaces(), vec!["hub", "edge-a", "edge-b"]);
    }
}
