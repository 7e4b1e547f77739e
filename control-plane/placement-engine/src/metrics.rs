use prometheus::{IntCounter, Opts, Registry};

/// Counters exported on the /metrics endpoint.
#[derive(Clone)]
pub struct EngineMetrics {
    pub reconciles_total: IntCounter,
    pub resets_total: IntCounter,
    pub steps_total: IntCounter,
    pub errors_total: IntCounter,
}

impl EngineMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let reconciles_total = IntCounter::with_opts(Opts::new(
            "placement_reconciles_total",
            "Total placement rule reconciles",
        ))?;
        let resets_total = IntCounter::with_opts(Opts::new(
            "placement_cycle_resets_total",
            "Total decision cycle resets",
        ))?;
        let steps_total = IntCounter::with_opts(Opts::new(
            "placement_decision_steps_total",
            "Total persisted decision steps",
        ))?;
        let errors_total = IntCounter::with_opts(Opts::new(
            "placement_reconcile_errors_total",
            "Total reconcile errors",
        ))?;

        registry.register(Box::new(reconciles_total.clone()))?;
        registry.register(Box::new(resets_total.clone()))?;
        registry.register(Box::new(steps_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;

        Ok(EngineMetrics {
            reconciles_total,
            resets_total,
            steps_total,
            errors_total,
        })
    }
}
