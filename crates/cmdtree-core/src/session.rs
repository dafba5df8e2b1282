//! Registry session
//!
//! A [`RegistrySession`] pairs the module registry with the remote client
//! and is passed explicitly to every admin operation. The registry lock is
//! held only while a snapshot is taken, never across a remote call.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLockReadGuard, RwLockWriteGuard};

use crate::command::{CommandDescriptor, DesiredSet};
use crate::registry::{Module, ModuleRegistry, RegistrySnapshot, SharedRegistry};
use crate::remote::RemoteTreeClient;
use crate::scope::{GuildId, Scope};
use crate::sync::{SyncEngine, SyncMode, SyncOptions, SyncPlan, SyncReport};
use crate::{Error, Result};

/// Explicit context threaded through every registry and sync operation
#[derive(Clone)]
pub struct RegistrySession {
    registry: SharedRegistry,
    client: Arc<dyn RemoteTreeClient>,
}

impl RegistrySession {
    pub fn new(registry: ModuleRegistry, client: Arc<dyn RemoteTreeClient>) -> Self {
        Self::from_shared(registry.into_shared(), client)
    }

    pub fn from_shared(registry: SharedRegistry, client: Arc<dyn RemoteTreeClient>) -> Self {
        Self { registry, client }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn client(&self) -> &dyn RemoteTreeClient {
        self.client.as_ref()
    }

    pub fn engine(&self) -> SyncEngine<'_> {
        SyncEngine::new(self.client.as_ref())
    }

    fn read(&self) -> RwLockReadGuard<'_, ModuleRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModuleRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of the loaded modules, taken under the registry lock.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.read().snapshot()
    }

    /// Load a module locally. No remote scope changes.
    pub fn load_module(&self, module: Module) -> Result<()> {
        self.write().load(module)
    }

    /// Unload a module locally, returning its commands. No remote scope
    /// changes.
    pub fn unload_module(&self, name: &str) -> Result<Vec<CommandDescriptor>> {
        self.write().unload(name)
    }

    pub fn loaded_module_names(&self) -> BTreeSet<String> {
        self.read().loaded_module_names()
    }

    /// Commands of a loaded module as a desired set.
    pub fn commands_of(&self, name: &str) -> Result<DesiredSet> {
        Ok(self.read().commands_of(name)?.cloned().collect())
    }

    /// Commands that belong in the global scope.
    pub fn global_desired(&self) -> DesiredSet {
        self.snapshot().global_desired()
    }

    /// Reject guild-specific commands that shadow a global command.
    ///
    /// Descriptors owned by the always-on module are copies of global
    /// commands and never collide.
    fn check_collisions(&self, scope: Scope, desired: &DesiredSet) -> Result<()> {
        if scope.is_global() {
            return Ok(());
        }
        let snapshot = self.snapshot();
        let global = snapshot.global_desired();
        let names: Vec<String> = desired
            .descriptors()
            .filter(|d| d.module != snapshot.always_on() && global.contains(&d.name))
            .map(|d| d.name.clone())
            .collect();
        if names.is_empty() {
            Ok(())
        } else {
            Err(Error::ScopeCollision { scope, names })
        }
    }

    /// Diff `desired` against `scope` without changing anything.
    pub async fn plan(&self, scope: Scope, desired: &DesiredSet, mode: &SyncMode) -> Result<SyncPlan> {
        self.check_collisions(scope, desired)?;
        Ok(self.engine().plan(scope, desired, mode).await?)
    }

    /// Make `scope` match `desired`.
    pub async fn sync(
        &self,
        scope: Scope,
        desired: &DesiredSet,
        mode: &SyncMode,
    ) -> Result<SyncReport> {
        self.sync_with_options(scope, desired, mode, &SyncOptions::default())
            .await
    }

    pub async fn sync_with_options(
        &self,
        scope: Scope,
        desired: &DesiredSet,
        mode: &SyncMode,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        self.check_collisions(scope, desired)?;
        Ok(self
            .engine()
            .sync_with_options(scope, desired, mode, options)
            .await?)
    }

    /// Replace the global scope with the always-on module's commands.
    pub async fn sync_global(&self) -> Result<SyncReport> {
        let desired = self.global_desired();
        self.sync(Scope::Global, &desired, &SyncMode::Replace).await
    }

    /// Remove every command from `scope`.
    pub async fn clear(&self, scope: Scope) -> Result<SyncReport> {
        self.sync(scope, &DesiredSet::new(), &SyncMode::Replace)
            .await
    }

    /// Copy the global commands into a guild.
    pub async fn copy_global_into(&self, guild: GuildId) -> Result<SyncReport> {
        let global = self.global_desired();
        Ok(self.engine().copy_global_into(guild, &global).await?)
    }

    /// Add a loaded module's commands to a guild, leaving other commands in
    /// the guild untouched.
    pub async fn attach(&self, guild: GuildId, module: &str) -> Result<SyncReport> {
        let desired = self.commands_of(module)?;
        tracing::debug!(guild = %guild, module, commands = desired.len(), "Attaching module");
        self.sync(Scope::Guild(guild), &desired, &SyncMode::merge())
            .await
    }

    /// Remove a loaded module's commands from a guild, leaving other
    /// commands in the guild untouched.
    pub async fn detach(&self, guild: GuildId, module: &str) -> Result<SyncReport> {
        let names = self.commands_of(module)?.name_set();
        tracing::debug!(guild = %guild, module, commands = names.len(), "Detaching module");
        self.sync(
            Scope::Guild(guild),
            &DesiredSet::new(),
            &SyncMode::merge_retracting(names),
        )
        .await
    }

    /// Retract a module's commands from `scope`, then unload it.
    ///
    /// The module stays loaded until the retraction is committed, so a
    /// failed call can be repeated as is.
    pub async fn unload_and_sync(&self, scope: Scope, module: &str) -> Result<SyncReport> {
        let retract = self.commands_of(module)?.name_set();
        let report = self
            .sync(scope, &DesiredSet::new(), &SyncMode::merge_retracting(retract))
            .await?;
        self.unload_module(module)?;
        Ok(report)
    }
}

impl std::fmt::Debug for RegistrySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySession")
            .field("modules", &self.loaded_module_names())
            .finish_non_exhaustive()
    }
}
