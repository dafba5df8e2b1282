//! Command context
//!
//! Loads the manifest, opens the state file it points at and builds the
//! registry session every command works through.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cmdtree_core::{
    DesiredSet, Manifest, RegistrySession, ReconciliationController, RemoteTreeClient,
};
use cmdtree_store::FileTree;

use crate::error::Result;

/// Everything a command needs
pub struct Context {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub tree: Arc<FileTree>,
    pub session: RegistrySession,
}

impl Context {
    /// Load the manifest at `config` and open its tree state.
    pub fn load(config: &Path) -> Result<Self> {
        let manifest = Manifest::load(config)?;
        let manifest_dir = config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tree = Arc::new(FileTree::open(manifest.state_path(manifest_dir))?);
        let registry = manifest.build_registry()?;
        let client: Arc<dyn RemoteTreeClient> = tree.clone();
        let session = RegistrySession::new(registry, client);

        tracing::debug!(
            manifest = %config.display(),
            state = %tree.path().display(),
            modules = ?session.loaded_module_names(),
            "Loaded context"
        );

        Ok(Self {
            manifest_path: config.to_path_buf(),
            manifest,
            tree,
            session,
        })
    }

    /// Load a declared module into the session unless it already is.
    pub fn ensure_loaded(&self, name: &str) -> Result<()> {
        if !self.session.loaded_module_names().contains(name) {
            self.session.load_module(self.manifest.module(name)?)?;
        }
        Ok(())
    }

    /// Union of the named modules' commands, loading them as needed.
    pub fn desired_for(&self, modules: &[String]) -> Result<DesiredSet> {
        let mut desired = DesiredSet::new();
        for name in modules {
            self.ensure_loaded(name)?;
            desired.extend(self.session.commands_of(name)?.descriptors().cloned());
        }
        Ok(desired)
    }

    /// Commands of every loaded module except the always-on one.
    pub fn autoload_desired(&self) -> Result<DesiredSet> {
        let always_on = &self.manifest.core.always_on;
        let names: Vec<String> = self
            .session
            .loaded_module_names()
            .into_iter()
            .filter(|name| name != always_on)
            .collect();
        self.desired_for(&names)
    }

    /// Reconciliation controller configured from the manifest.
    pub fn controller(&self) -> ReconciliationController {
        ReconciliationController::new(self.session.clone())
            .with_concurrency(self.manifest.core.concurrency)
            .with_retry(self.manifest.retry_policy())
    }

    /// Controller that treats the `copy_global` guilds as already carrying
    /// the global commands, for work that skips the copy-down step.
    pub fn controller_with_copies(&self) -> ReconciliationController {
        let controller = self.controller();
        controller.assume_global_copy(self.manifest.guilds.copy_global.iter().copied());
        controller
    }
}
