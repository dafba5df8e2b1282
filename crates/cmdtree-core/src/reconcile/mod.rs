//! Startup and on-demand reconciliation
//!
//! Nothing records which guild wants which module. The controller rebuilds
//! that mapping from what each guild currently exposes: a loaded module is
//! believed active in a guild when at least one of its command names is
//! live there. The scope is then replaced with the union of the believed
//! active modules' commands, which also removes remote names no loaded
//! module produces.

mod report;
mod retry;

pub use report::{ReconcileOutcome, ReconcileSummary, ScopeFailure};
pub use retry::RetryPolicy;

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use futures::stream::{self, StreamExt};

use crate::command::DesiredSet;
use crate::error::SyncError;
use crate::scope::{GuildId, Scope};
use crate::session::RegistrySession;
use crate::sync::{SyncMode, SyncPlan, SyncReport};
use crate::Result;

/// Default number of scopes reconciled at once
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Desired state rebuilt for one scope, with the listing it came from
struct Rebuilt {
    desired: DesiredSet,
    active: BTreeSet<String>,
    remote: Vec<String>,
}

/// Rebuilds desired state per scope and drives the sync engine to match it.
pub struct ReconciliationController {
    session: RegistrySession,
    concurrency: usize,
    retry: RetryPolicy,
    active: RwLock<HashMap<GuildId, BTreeSet<String>>>,
    copied: RwLock<BTreeSet<GuildId>>,
}

impl ReconciliationController {
    pub fn new(session: RegistrySession) -> Self {
        Self {
            session,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::disabled(),
            active: RwLock::new(HashMap::new()),
            copied: RwLock::new(BTreeSet::new()),
        }
    }

    /// Limit how many scopes `reconcile_all` works on at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn session(&self) -> &RegistrySession {
        &self.session
    }

    /// Modules believed active in `guild` as of its last reconciliation.
    pub fn active_modules(&self, guild: GuildId) -> BTreeSet<String> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&guild)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_global_copy(&self, guild: GuildId) -> bool {
        self.copied
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&guild)
    }

    /// Treat the guilds as already carrying a copy of the global commands.
    ///
    /// Used when planning without performing the copy-down itself.
    pub fn assume_global_copy(&self, guilds: impl IntoIterator<Item = GuildId>) {
        self.copied
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(guilds);
    }

    /// Copy the global commands into `guild` and remember that it carries
    /// them, so later reconciliations keep the copies.
    pub async fn copy_global_into(&self, guild: GuildId) -> Result<SyncReport> {
        let report = self.session.copy_global_into(guild).await?;
        self.assume_global_copy([guild]);
        Ok(report)
    }

    async fn rebuild(&self, scope: Scope) -> Result<Rebuilt> {
        let remote = self
            .session
            .client()
            .list(scope)
            .await
            .map_err(|cause| SyncError::from_remote(scope, 0, 0, cause))?;
        let snapshot = self.session.snapshot();

        let (desired, active) = match scope {
            Scope::Global => {
                let active = if snapshot.is_loaded(snapshot.always_on()) {
                    BTreeSet::from([snapshot.always_on().to_string()])
                } else {
                    BTreeSet::new()
                };
                (snapshot.global_desired(), active)
            }
            Scope::Guild(guild) => {
                let active = snapshot.modules_matching(&remote);
                let mut desired = snapshot.desired_for(active.iter().map(String::as_str));
                if self.has_global_copy(guild) {
                    desired.extend(snapshot.global_desired().descriptors().cloned());
                }
                (desired, active)
            }
        };

        Ok(Rebuilt {
            desired,
            active,
            remote,
        })
    }

    /// Compute what reconciling `scope` would change, without changing it.
    pub async fn plan(&self, scope: Scope) -> Result<SyncPlan> {
        let rebuilt = self.rebuild(scope).await?;
        Ok(SyncPlan::compute(
            scope,
            &rebuilt.desired,
            &rebuilt.remote,
            &SyncMode::Replace,
        ))
    }

    /// Rebuild the desired set of `scope` and replace the scope with it.
    pub async fn reconcile(&self, scope: Scope) -> Result<ReconcileOutcome> {
        let Rebuilt {
            desired,
            active,
            remote,
        } = self.rebuild(scope).await?;

        let orphaned: Vec<String> = remote
            .iter()
            .filter(|name| !desired.contains(name))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !orphaned.is_empty() {
            tracing::warn!(
                scope = %scope,
                orphaned = ?orphaned,
                "Removing commands no loaded module provides"
            );
        }

        let session = &self.session;
        let desired_ref = &desired;
        let mode = SyncMode::Replace;
        let mode_ref = &mode;
        let report = self
            .retry
            .run(|| session.sync(scope, desired_ref, mode_ref))
            .await?;

        if let Some(guild) = scope.guild_id() {
            self.active
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(guild, active.clone());
        }

        Ok(ReconcileOutcome {
            scope,
            active_modules: active,
            orphaned,
            report,
        })
    }

    async fn reconcile_into(&self, summary: &mut ReconcileSummary, scopes: BTreeSet<Scope>) {
        let results: Vec<(Scope, Result<ReconcileOutcome>)> = stream::iter(scopes)
            .map(|scope| async move { (scope, self.reconcile(scope).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (scope, result) in results {
            match result {
                Ok(outcome) => summary.outcomes.push(outcome),
                Err(err) => {
                    tracing::warn!(scope = %scope, error = %err, "Reconciliation failed");
                    summary.failures.push(ScopeFailure::new(scope, &err));
                }
            }
        }
    }

    /// Reconcile every scope, a bounded number at a time.
    ///
    /// A failing scope is recorded in the summary and does not stop the
    /// others.
    pub async fn reconcile_all(&self, scopes: impl IntoIterator<Item = Scope>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::start();
        self.reconcile_into(&mut summary, scopes.into_iter().collect())
            .await;
        summary.finish()
    }

    /// Process start: copy the global commands into each `copy_global`
    /// guild that has not received them yet, then reconcile the global
    /// scope and every listed guild.
    pub async fn startup(&self, guilds: &[GuildId], copy_global: &[GuildId]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::start();
        tracing::info!(
            run_id = %summary.run_id,
            guilds = guilds.len(),
            "Starting reconciliation"
        );

        for guild in copy_global {
            if self.has_global_copy(*guild) {
                continue;
            }
            match self.copy_global_into(*guild).await {
                Ok(report) => summary.copied.push(report),
                Err(err) => {
                    tracing::warn!(guild = %guild, error = %err, "Copy-down failed");
                    summary
                        .failures
                        .push(ScopeFailure::new(Scope::Guild(*guild), &err));
                }
            }
        }

        let scopes: BTreeSet<Scope> = std::iter::once(Scope::Global)
            .chain(guilds.iter().copied().map(Scope::Guild))
            .chain(copy_global.iter().copied().map(Scope::Guild))
            .collect();
        self.reconcile_into(&mut summary, scopes).await;

        let summary = summary.finish();
        tracing::info!(
            run_id = %summary.run_id,
            added = summary.total_added(),
            removed = summary.total_removed(),
            failures = summary.failures.len(),
            "Reconciliation finished"
        );
        summary
    }
}
