//! Manifest parsing for cmdtree.toml files
//!
//! The manifest declares the modules this process can load, which module is
//! always on (its commands form the global scope), the guilds to manage and
//! the reconciliation settings.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::reconcile::{DEFAULT_CONCURRENCY, RetryPolicy};
use crate::registry::{DEFAULT_ALWAYS_ON, Module, ModuleRegistry};
use crate::scope::{GuildId, Scope};
use crate::{Error, Result};

/// Default file name looked up by the CLI
pub const MANIFEST_FILE: &str = "cmdtree.toml";

fn default_always_on() -> String {
    DEFAULT_ALWAYS_ON.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_state() -> PathBuf {
    PathBuf::from(".cmdtree/tree.json")
}

fn default_initial_interval_ms() -> u64 {
    250
}

fn default_max_elapsed_ms() -> u64 {
    10_000
}

/// Core configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSection {
    /// Module whose commands form the global scope
    #[serde(default = "default_always_on")]
    pub always_on: String,

    /// Number of scopes reconciled at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// State file of the file-backed command tree, relative to the manifest
    #[serde(default = "default_state")]
    pub state: PathBuf,
}

impl Default for CoreSection {
    fn default() -> Self {
        Self {
            always_on: default_always_on(),
            concurrency: default_concurrency(),
            state: default_state(),
        }
    }
}

/// Retry settings for interrupted syncs during reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_interval_ms: default_initial_interval_ms(),
            max_elapsed_ms: default_max_elapsed_ms(),
        }
    }
}

/// Guilds managed by this process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildsSection {
    /// Guilds reconciled at startup
    #[serde(default)]
    pub managed: Vec<GuildId>,

    /// Guilds that receive a copy of the global commands at startup
    #[serde(default)]
    pub copy_global: Vec<GuildId>,
}

/// A command declared by a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A module declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSection {
    /// Load the module when the registry is built
    #[serde(default)]
    pub autoload: bool,

    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

/// Parsed cmdtree.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub core: CoreSection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub guilds: GuildsSection,

    /// Module declarations keyed by module name
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSection>,
}

impl Manifest {
    /// Parse and validate a manifest from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use cmdtree_core::config::Manifest;
    ///
    /// let manifest = Manifest::parse(r#"
    /// [core]
    /// always_on = "general"
    ///
    /// [modules.events]
    /// autoload = true
    /// commands = [{ name = "schedule" }, { name = "cancel" }]
    /// "#).unwrap();
    ///
    /// assert_eq!(manifest.module("events").unwrap().commands().len(), 2);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Manifest with default settings and no modules
    pub fn empty() -> Self {
        Self::default()
    }

    fn validate(&self) -> Result<()> {
        if self.core.concurrency == 0 {
            return Err(Error::Config {
                message: "core.concurrency must be at least 1".to_string(),
            });
        }
        for (name, section) in &self.modules {
            if let Some(spec) = section.commands.iter().find(|c| c.name.trim().is_empty()) {
                return Err(Error::Config {
                    message: format!(
                        "module {} declares a command with an empty name ({:?})",
                        name, spec.description
                    ),
                });
            }
        }
        Ok(())
    }

    /// Build the declared module called `name`.
    pub fn module(&self, name: &str) -> Result<Module> {
        let section = self.modules.get(name).ok_or_else(|| Error::UnknownModule {
            name: name.to_string(),
        })?;
        Ok(section
            .commands
            .iter()
            .fold(Module::new(name), |module, spec| {
                module.with_command(&spec.name, &spec.description)
            }))
    }

    /// Every declared module, in name order.
    pub fn modules(&self) -> Result<Vec<Module>> {
        self.modules.keys().map(|name| self.module(name)).collect()
    }

    /// Build a registry with the always-on module and every autoload module
    /// loaded.
    pub fn build_registry(&self) -> Result<ModuleRegistry> {
        let mut registry = ModuleRegistry::new(self.core.always_on.clone());
        for (name, section) in &self.modules {
            if section.autoload || *name == self.core.always_on {
                registry.load(self.module(name)?)?;
            }
        }
        Ok(registry)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        if self.retry.enabled {
            RetryPolicy::exponential(
                Duration::from_millis(self.retry.initial_interval_ms),
                Duration::from_millis(self.retry.max_elapsed_ms),
            )
        } else {
            RetryPolicy::disabled()
        }
    }

    /// Global plus every managed and copy-down guild, without duplicates.
    pub fn managed_scopes(&self) -> Vec<Scope> {
        let scopes: BTreeSet<Scope> = std::iter::once(Scope::Global)
            .chain(self.guilds.managed.iter().copied().map(Scope::Guild))
            .chain(self.guilds.copy_global.iter().copied().map(Scope::Guild))
            .collect();
        scopes.into_iter().collect()
    }

    /// Resolve the state file against the directory holding the manifest.
    pub fn state_path(&self, manifest_dir: &Path) -> PathBuf {
        if self.core.state.is_absolute() {
            self.core.state.clone()
        } else {
            manifest_dir.join(&self.core.state)
        }
    }
}
