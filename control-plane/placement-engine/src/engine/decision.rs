//! The decision state machine.
//!
//! Both entry points mutate an in-memory rule snapshot and report whether
//! anything changed; persisting the result is the reconciler's job. Each
//! non-settled step removes at least one candidate, so a cycle over a finite
//! pool always terminates.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::warn;

use placement_api::registry;
use placement_api::{
    AdvisorType, PlacementRule, PlacementRuleSpec, PlacementRuleStatus,
    TargetReference, DEFAULT_ADVISOR_WEIGHT, DEFAULT_DECISION_WEIGHT,
    DEFAULT_SCORE,
};

/// How many candidates an elimination round removes.
const DEFAULT_STEP: usize = 1;

/// Install a freshly generated candidate pool and restart the cycle.
///
/// Prior decisions deliberately survive: stickiness biases the new cycle
/// until it re-decides.
pub fn reset(rule: &mut PlacementRule, mut candidates: Vec<TargetReference>) {
    for adv in &rule.spec.advisors {
        if adv.advisor_type == Some(AdvisorType::Unknown) {
            warn!(
                advisor = %adv.name,
                "unrecognized advisor type, treating as priority"
            );
        }
    }

    // Traversal order is fixed here; elimination tie-breaks depend on it.
    candidates.sort_by(|a, b| {
        (&a.namespace, &a.name, &a.uid).cmp(&(&b.namespace, &b.name, &b.uid))
    });

    let generation = rule.metadata.generation;
    let status = rule
        .status
        .get_or_insert_with(PlacementRuleStatus::default);
    status.candidates = candidates;
    status.eliminators.clear();
    status.recommendations.clear();
    status.observed_generation = generation;
    status.last_update_time = Some(Utc::now().to_rfc3339());
}

/// Run one convergence step. Returns true when status changed and must be
/// persisted.
///
/// The caller gates on every invited advisor having published; the step
/// itself still degrades safely on a stale snapshot.
pub fn step(rule: &mut PlacementRule) -> bool {
    let spec = &rule.spec;
    let Some(status) = rule.status.as_mut() else {
        return false;
    };

    let mut decisions = filter_by_advisor_type(
        status.candidates.clone(),
        spec,
        status,
        AdvisorType::Predicate,
    );

    // Predicates are a hard gate: nothing passing means nothing to place.
    if decisions.is_empty() {
        if !status.decisions.is_empty() {
            status.decisions.clear();
            return true;
        }
        return false;
    }

    let replicas = replica_target(spec, decisions.len());

    // Priorities are preferences; they only narrow when there are more
    // predicate-passing options than slots.
    if decisions.len() > replicas {
        decisions = filter_by_advisor_type(
            decisions,
            spec,
            status,
            AdvisorType::Priority,
        );
    }

    let replicas = replica_target(spec, decisions.len());
    if decisions.len() == replicas || status.candidates.len() <= replicas {
        return commit_decisions(decisions, status);
    }

    reduce_candidates(spec, status)
}

fn replica_target(spec: &PlacementRuleSpec, fallback: usize) -> usize {
    match spec.replicas {
        Some(r) => r.max(0) as usize,
        None => fallback,
    }
}

/// Intersect `decisions` with the recommendation set of every advisor of the
/// given type. A deny marker or a missing entry counts as the empty set.
fn filter_by_advisor_type(
    mut decisions: Vec<TargetReference>,
    spec: &PlacementRuleSpec,
    status: &PlacementRuleStatus,
    advisor_type: AdvisorType,
) -> Vec<TargetReference> {
    for adv in &spec.advisors {
        if adv.effective_type() != advisor_type {
            continue;
        }
        let recset: HashSet<&str> =
            match registry::recommendation_for(status, &adv.name) {
                Some(rec) if !rec.deny => rec
                    .references
                    .iter()
                    .map(|sr| sr.reference.key())
                    .collect(),
                _ => HashSet::new(),
            };
        decisions.retain(|or| recset.contains(or.key()));
    }
    decisions
}

fn commit_decisions(
    decisions: Vec<TargetReference>,
    status: &mut PlacementRuleStatus,
) -> bool {
    if registry::equal_decisions(&decisions, &status.decisions) {
        return false;
    }
    status.decisions = decisions;
    true
}

/// Shrink the pool by one step: first purge candidates a predicate rejects,
/// otherwise eliminate the lowest-weighted candidate. Either way the stale
/// recommendations are wiped so advisors re-advise against the smaller pool.
fn reduce_candidates(
    spec: &PlacementRuleSpec,
    status: &mut PlacementRuleStatus,
) -> bool {
    let kept = filter_by_advisor_type(
        status.candidates.clone(),
        spec,
        status,
        AdvisorType::Predicate,
    );
    if kept.len() < status.candidates.len() {
        let kept_keys: HashSet<&str> =
            kept.iter().map(|or| or.key()).collect();
        let purged: Vec<TargetReference> = status
            .candidates
            .iter()
            .filter(|or| !kept_keys.contains(or.key()))
            .cloned()
            .collect();
        status.eliminators.extend(purged);
        status.candidates = kept;
        status.recommendations.clear();
        return true;
    }

    let victims = match pick_victims(spec, status) {
        Some(victims) => victims,
        None => return false,
    };

    let mut remaining = Vec::with_capacity(status.candidates.len());
    for (idx, or) in status.candidates.drain(..).enumerate() {
        if victims.contains(&idx) {
            status.eliminators.push(or);
        } else {
            remaining.push(or);
        }
    }
    status.candidates = remaining;
    status.recommendations.clear();
    true
}

/// Indices of the candidates to eliminate this round: the `DEFAULT_STEP`
/// lowest-weighted ones. On equal weight the later traversal position loses,
/// so the front of the pool survives ties.
fn pick_victims(
    spec: &PlacementRuleSpec,
    status: &PlacementRuleStatus,
) -> Option<HashSet<usize>> {
    let mut weights: HashMap<&str, i32> = status
        .candidates
        .iter()
        .map(|or| (or.key(), 0i32))
        .collect();

    for adv in &spec.advisors {
        if adv.effective_type() != AdvisorType::Priority {
            continue;
        }
        // The reconciler gates on readiness; a missing entry means this
        // snapshot is stale, so leave the pool alone.
        let rec = registry::recommendation_for(status, &adv.name)?;
        if rec.deny {
            continue;
        }
        // Weights and scores are i16 on the wire; widen before multiplying.
        let advisor_weight =
            i32::from(adv.weight.unwrap_or(DEFAULT_ADVISOR_WEIGHT));
        for sr in &rec.references {
            if let Some(w) = weights.get_mut(sr.reference.key()) {
                let score = i32::from(sr.score.unwrap_or(DEFAULT_SCORE));
                *w += score * advisor_weight / 100;
            }
        }
    }

    let sticky =
        i32::from(spec.decision_weight.unwrap_or(DEFAULT_DECISION_WEIGHT));
    for or in &status.decisions {
        if let Some(w) = weights.get_mut(or.key()) {
            *w += sticky;
        }
    }

    let mut order: Vec<usize> = (0..status.candidates.len()).collect();
    order.sort_by(|&x, &y| {
        let wx = weights[status.candidates[x].key()];
        let wy = weights[status.candidates[y].key()];
        wx.cmp(&wy).then(y.cmp(&x))
    });
    Some(order.into_iter().take(DEFAULT_STEP).collect())
}
