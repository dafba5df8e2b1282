//! SyncEngine implementation
//!
//! The SyncEngine applies the diff between a desired set and a scope's
//! remote listing through a [`RemoteTreeClient`]. It owns no state.

use serde::{Deserialize, Serialize};

use crate::command::DesiredSet;
use crate::error::SyncError;
use crate::remote::RemoteTreeClient;
use crate::scope::{GuildId, Scope};

use super::plan::{SyncMode, SyncPlan};

/// Report from a sync, dry run or copy-down
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Scope the operation targeted
    pub scope: Scope,
    /// Number of commands added
    pub added: usize,
    /// Number of commands removed
    pub removed: usize,
    /// Names of the commands added
    pub added_names: Vec<String>,
    /// Names of the commands removed
    pub removed_names: Vec<String>,
    /// Whether the report describes planned rather than applied changes
    pub dry_run: bool,
}

impl SyncReport {
    fn from_plan(plan: &SyncPlan, dry_run: bool) -> Self {
        Self {
            scope: plan.scope,
            added: plan.to_add.len(),
            removed: plan.to_remove.len(),
            added_names: plan.to_add.iter().map(|d| d.name.clone()).collect(),
            removed_names: plan.to_remove.clone(),
            dry_run,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0
    }

    /// One-line human summary, e.g. `guild:123: 2 added, 0 removed`.
    pub fn summary(&self) -> String {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        format!(
            "{}{}: {} added, {} removed",
            prefix, self.scope, self.added, self.removed
        )
    }
}

/// Options for sync operations
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// If true, list the scope and report the plan without mutating it.
    pub dry_run: bool,
}

/// Engine for synchronizing one scope at a time
///
/// Remote calls are issued sequentially: every add, then every removal,
/// then a single commit. If the commit fails after adds succeeded the scope
/// holds a superset of the desired commands, never a subset.
pub struct SyncEngine<'a> {
    client: &'a dyn RemoteTreeClient,
}

impl<'a> SyncEngine<'a> {
    pub fn new(client: &'a dyn RemoteTreeClient) -> Self {
        Self { client }
    }

    /// List `scope` and compute the calls a sync would make.
    pub async fn plan(
        &self,
        scope: Scope,
        desired: &DesiredSet,
        mode: &SyncMode,
    ) -> Result<SyncPlan, SyncError> {
        let remote = self
            .client
            .list(scope)
            .await
            .map_err(|cause| SyncError::from_remote(scope, 0, 0, cause))?;
        tracing::debug!(scope = %scope, remote = remote.len(), "Listed remote commands");
        Ok(SyncPlan::compute(scope, desired, &remote, mode))
    }

    /// Apply a previously computed plan.
    ///
    /// The commit is issued even for an empty plan so that changes staged
    /// by an interrupted earlier attempt are published.
    pub async fn apply(&self, plan: SyncPlan) -> Result<SyncReport, SyncError> {
        let scope = plan.scope;
        let mut applied_adds = 0;
        let mut applied_removes = 0;

        for descriptor in &plan.to_add {
            self.client
                .upsert(scope, descriptor)
                .await
                .map_err(|cause| SyncError::from_remote(scope, applied_adds, 0, cause))?;
            applied_adds += 1;
            tracing::debug!(scope = %scope, command = %descriptor.name, "Staged command");
        }

        for name in &plan.to_remove {
            let removed = self.client.remove(scope, name).await.map_err(|cause| {
                SyncError::from_remote(scope, applied_adds, applied_removes, cause)
            })?;
            applied_removes += 1;
            if !removed {
                tracing::debug!(scope = %scope, command = %name, "Command already absent");
            }
        }

        self.client.commit(scope).await.map_err(|cause| {
            SyncError::from_remote(scope, applied_adds, applied_removes, cause)
        })?;

        let report = SyncReport::from_plan(&plan, false);
        tracing::info!(
            scope = %scope,
            added = report.added,
            removed = report.removed,
            "Synchronized scope"
        );
        Ok(report)
    }

    /// Make `scope` match `desired`.
    ///
    /// In [`SyncMode::Replace`] every undesired remote name is removed. In
    /// [`SyncMode::Merge`] only the retracted names are.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Partial`] when a transient remote failure interrupted
    ///   the sequence; repeating the identical call converges
    /// - [`SyncError::Fatal`] when the remote reported a permanent failure
    pub async fn sync(
        &self,
        scope: Scope,
        desired: &DesiredSet,
        mode: &SyncMode,
    ) -> Result<SyncReport, SyncError> {
        self.sync_with_options(scope, desired, mode, &SyncOptions::default())
            .await
    }

    /// Sync with options. A dry run only lists the scope.
    pub async fn sync_with_options(
        &self,
        scope: Scope,
        desired: &DesiredSet,
        mode: &SyncMode,
        options: &SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let plan = self.plan(scope, desired, mode).await?;
        if options.dry_run {
            return Ok(SyncReport::from_plan(&plan, true));
        }
        self.apply(plan).await
    }

    /// Copy the global commands into a guild scope and publish them.
    ///
    /// Every global descriptor is upserted, overriding any same-named
    /// command already in the guild. Nothing is removed.
    pub async fn copy_global_into(
        &self,
        guild: GuildId,
        global: &DesiredSet,
    ) -> Result<SyncReport, SyncError> {
        let scope = Scope::Guild(guild);
        let mut added_names = Vec::with_capacity(global.len());

        for descriptor in global {
            self.client
                .upsert(scope, descriptor)
                .await
                .map_err(|cause| SyncError::from_remote(scope, added_names.len(), 0, cause))?;
            added_names.push(descriptor.name.clone());
        }

        self.client
            .commit(scope)
            .await
            .map_err(|cause| SyncError::from_remote(scope, added_names.len(), 0, cause))?;

        tracing::info!(scope = %scope, copied = added_names.len(), "Copied global commands");
        Ok(SyncReport {
            scope,
            added: added_names.len(),
            removed: 0,
            added_names,
            removed_names: Vec::new(),
            dry_run: false,
        })
    }
}
