//! Import reconciliation.
//!
//! Decides, for each local runbook, whether the service needs it created,
//! patched, or left alone.

use std::collections::{HashMap, HashSet};

use super::Runbook;

/// Outcome of comparing local runbooks against the service.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    /// Local runbooks unknown to the service
    pub to_create: Vec<Runbook>,
    /// Local runbooks whose content differs from the service copy
    pub to_patch: Vec<Runbook>,
    /// Ids of local runbooks identical to the service copy
    pub unchanged: Vec<String>,
    /// Ids of service runbooks with no local file
    pub remote_only: Vec<String>,
}

impl ReconcilePlan {
    /// Whether the plan requires any request to the service.
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_patch.is_empty()
    }
}

/// Index runbooks by identifier.
pub fn index_by_id(runbooks: Vec<Runbook>) -> HashMap<String, Runbook> {
    runbooks.into_iter().map(|r| (r.id.clone(), r)).collect()
}

/// Partition local runbooks against the current service state.
pub fn reconcile(remote: &HashMap<String, Runbook>, local: Vec<Runbook>) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut seen = HashSet::new();

    for runbook in local {
        seen.insert(runbook.id.clone());
        match remote.get(&runbook.id) {
            None => plan.to_create.push(runbook),
            Some(current) if runbook.same_content(current) => plan.unchanged.push(runbook.id),
            Some(_) => plan.to_patch.push(runbook),
        }
    }

    plan.remote_only = remote.keys().filter(|id| !seen.contains(*id)).cloned().collect();
    plan.remote_only.sort();

    tracing::debug!(
        create = plan.to_create.len(),
        patch = plan.to_patch.len(),
        unchanged = plan.unchanged.len(),
        remote_only = plan.remote_only.len(),
        "Reconciled runbooks"
    );

    plan
}
