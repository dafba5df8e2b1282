//! Reconciliation reports

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;
use crate::scope::Scope;
use crate::sync::SyncReport;

/// Result of reconciling one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub scope: Scope,
    /// Modules believed active in the scope after matching remote names
    pub active_modules: BTreeSet<String>,
    /// Remote names no loaded module produces; removed by the sync
    pub orphaned: Vec<String>,
    pub report: SyncReport,
}

/// A scope that could not be reconciled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFailure {
    pub scope: Scope,
    pub message: String,
    /// The failure is a local module problem rather than a remote one
    pub module_problem: bool,
    /// Repeating the reconciliation may succeed
    pub retryable: bool,
}

impl ScopeFailure {
    pub fn new(scope: Scope, error: &Error) -> Self {
        Self {
            scope,
            message: error.to_string(),
            module_problem: error.is_module_problem(),
            retryable: error.is_retryable(),
        }
    }
}

/// Report of a multi-scope reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Copy-down operations performed before reconciling
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub copied: Vec<SyncReport>,
    pub outcomes: Vec<ReconcileOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ScopeFailure>,
}

impl ReconcileSummary {
    pub(crate) fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            copied: Vec::new(),
            outcomes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.outcomes.sort_by_key(|outcome| outcome.scope);
        self.failures.sort_by_key(|failure| failure.scope);
        self.finished_at = Utc::now();
        self
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_added(&self) -> usize {
        self.outcomes.iter().map(|o| o.report.added).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.outcomes.iter().map(|o| o.report.removed).sum()
    }

    pub fn outcome(&self, scope: Scope) -> Option<&ReconcileOutcome> {
        self.outcomes.iter().find(|o| o.scope == scope)
    }

    pub fn failure(&self, scope: Scope) -> Option<&ScopeFailure> {
        self.failures.iter().find(|f| f.scope == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use crate::error::SyncError;

    fn outcome(scope: Scope, added: usize, removed: usize) -> ReconcileOutcome {
        ReconcileOutcome {
            scope,
            active_modules: BTreeSet::new(),
            orphaned: Vec::new(),
            report: SyncReport {
                scope,
                added,
                removed,
                added_names: Vec::new(),
                removed_names: Vec::new(),
                dry_run: false,
            },
        }
    }

    #[test]
    fn finish_orders_outcomes_by_scope() {
        let mut summary = ReconcileSummary::start();
        summary.outcomes.push(outcome(Scope::guild(9), 1, 0));
        summary.outcomes.push(outcome(Scope::Global, 0, 2));
        summary.outcomes.push(outcome(Scope::guild(3), 2, 1));
        let summary = summary.finish();

        let order: Vec<Scope> = summary.outcomes.iter().map(|o| o.scope).collect();
        assert_eq!(order, vec![Scope::Global, Scope::guild(3), Scope::guild(9)]);
        assert_eq!(summary.total_added(), 3);
        assert_eq!(summary.total_removed(), 3);
        assert!(summary.is_success());
        assert!(summary.finished_at >= summary.started_at);
    }

    #[test]
    fn failure_records_classification() {
        let error: Error =
            SyncError::from_remote(Scope::guild(1), 0, 0, RemoteError::permanent("gone")).into();
        let failure = ScopeFailure::new(Scope::guild(1), &error);
        assert!(!failure.module_problem);
        assert!(!failure.retryable);
        assert!(failure.message.contains("gone"));
    }
}
