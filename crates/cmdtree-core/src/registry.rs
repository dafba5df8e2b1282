//! Module registry
//!
//! The registry is the single owner of module lifecycle state. Each module
//! moves through a small transition table:
//!
//! ```text
//! Unloaded --load--> Loaded(commands) --unload--> Unloaded
//! ```
//!
//! Loading and unloading are purely local. Retracting commands from a
//! remote scope is a separate sync operation.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, RwLock};

use crate::command::{CommandDescriptor, DesiredSet};
use crate::{Error, Result};

/// Name of the module whose commands form the global scope by default
pub const DEFAULT_ALWAYS_ON: &str = "general";

/// Registry shared between a session, its controller and admin callers
pub type SharedRegistry = Arc<RwLock<ModuleRegistry>>;

/// A named unit owning zero or more commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: String,
    commands: Vec<CommandDescriptor>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Build a module from descriptors, re-homing each one to this module.
    pub fn from_commands(
        name: impl Into<String>,
        commands: impl IntoIterator<Item = CommandDescriptor>,
    ) -> Self {
        let name = name.into();
        let commands = commands
            .into_iter()
            .map(|mut command| {
                command.module = name.clone();
                command
            })
            .collect();
        Self { name, commands }
    }

    /// Add a command with no description.
    pub fn command(self, name: impl Into<String>) -> Self {
        self.with_command(name, "")
    }

    /// Add a command with a description.
    pub fn with_command(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        let descriptor = CommandDescriptor::new(name, self.name.clone()).with_description(description);
        self.commands.push(descriptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[CommandDescriptor] {
        &self.commands
    }
}

/// Lifecycle state of a module known to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleState {
    Unloaded,
    Loaded(Vec<CommandDescriptor>),
}

impl ModuleState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModuleState::Loaded(_))
    }
}

/// Tracks which modules are loaded and the commands each contributes.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleState>,
    always_on: String,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ALWAYS_ON)
    }
}

impl ModuleRegistry {
    /// Create an empty registry whose global commands come from `always_on`.
    pub fn new(always_on: impl Into<String>) -> Self {
        Self {
            modules: BTreeMap::new(),
            always_on: always_on.into(),
        }
    }

    /// Wrap the registry for sharing across a session.
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Load a module, making its commands available.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyLoaded`] if a module with the same name is loaded
    /// - [`Error::DuplicateCommand`] if the module repeats a command name or
    ///   shares one with another loaded module
    pub fn load(&mut self, module: Module) -> Result<()> {
        if self.is_loaded(module.name()) {
            return Err(Error::AlreadyLoaded {
                name: module.name,
            });
        }

        let mut seen = HashSet::new();
        for command in &module.commands {
            if !seen.insert(command.name.as_str()) {
                return Err(Error::DuplicateCommand {
                    module: module.name.clone(),
                    command: command.name.clone(),
                    existing: module.name.clone(),
                });
            }
            if let Some(owner) = self.owner_of(&command.name) {
                return Err(Error::DuplicateCommand {
                    module: module.name.clone(),
                    command: command.name.clone(),
                    existing: owner.to_string(),
                });
            }
        }

        tracing::debug!(
            module = %module.name,
            commands = module.commands.len(),
            "Loaded module"
        );
        self.modules
            .insert(module.name, ModuleState::Loaded(module.commands));
        Ok(())
    }

    /// Unload a module, returning the commands it contributed.
    ///
    /// Remote scopes are not touched; callers that want the commands gone
    /// remotely pass the returned list to a merge sync.
    pub fn unload(&mut self, name: &str) -> Result<Vec<CommandDescriptor>> {
        match self
            .modules
            .get_mut(name)
            .map(|state| std::mem::replace(state, ModuleState::Unloaded))
        {
            Some(ModuleState::Loaded(commands)) => {
                tracing::debug!(module = %name, commands = commands.len(), "Unloaded module");
                Ok(commands)
            }
            _ => Err(Error::NotLoaded {
                name: name.to_string(),
            }),
        }
    }

    /// Iterate the commands of a loaded module.
    pub fn commands_of(&self, name: &str) -> Result<std::slice::Iter<'_, CommandDescriptor>> {
        match self.modules.get(name) {
            Some(ModuleState::Loaded(commands)) => Ok(commands.iter()),
            _ => Err(Error::NotLoaded {
                name: name.to_string(),
            }),
        }
    }

    pub fn loaded_module_names(&self) -> BTreeSet<String> {
        self.modules
            .iter()
            .filter(|(_, state)| state.is_loaded())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Names of every module ever loaded, including unloaded ones.
    pub fn known_module_names(&self) -> BTreeSet<String> {
        self.modules.keys().cloned().collect()
    }

    pub fn state(&self, name: &str) -> Option<&ModuleState> {
        self.modules.get(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.get(name).is_some_and(ModuleState::is_loaded)
    }

    /// Find the loaded module that contributes `command`.
    pub fn owner_of(&self, command: &str) -> Option<&str> {
        self.modules.iter().find_map(|(name, state)| match state {
            ModuleState::Loaded(commands) if commands.iter().any(|c| c.name == command) => {
                Some(name.as_str())
            }
            _ => None,
        })
    }

    pub fn always_on(&self) -> &str {
        &self.always_on
    }

    /// Take an owned copy of every loaded module's command list.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let modules = self
            .modules
            .iter()
            .filter_map(|(name, state)| match state {
                ModuleState::Loaded(commands) => Some((name.clone(), commands.clone())),
                ModuleState::Unloaded => None,
            })
            .collect();
        RegistrySnapshot {
            always_on: self.always_on.clone(),
            modules,
        }
    }
}

/// Point-in-time copy of the loaded modules.
///
/// Sync paths work from a snapshot so the registry lock is never held
/// across remote calls.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    always_on: String,
    modules: BTreeMap<String, Vec<CommandDescriptor>>,
}

impl RegistrySnapshot {
    pub fn always_on(&self) -> &str {
        &self.always_on
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn commands_of(&self, name: &str) -> Result<&[CommandDescriptor]> {
        self.modules
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::NotLoaded {
                name: name.to_string(),
            })
    }

    /// Commands of the always-on module, empty if it is not loaded.
    pub fn global_desired(&self) -> DesiredSet {
        self.modules
            .get(&self.always_on)
            .map(|commands| commands.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Union of the commands of the given modules. Unloaded names are skipped.
    pub fn desired_for<'a>(&self, modules: impl IntoIterator<Item = &'a str>) -> DesiredSet {
        modules
            .into_iter()
            .filter_map(|name| self.modules.get(name))
            .flat_map(|commands| commands.iter().cloned())
            .collect()
    }

    /// Loaded modules that contribute at least one of `names`.
    pub fn modules_matching<S: AsRef<str>>(&self, names: &[S]) -> BTreeSet<String> {
        let present: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        self.modules
            .iter()
            .filter(|(_, commands)| commands.iter().any(|c| present.contains(c.name.as_str())))
            .map(|(module, _)| module.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn events() -> Module {
        Module::new("events")
            .with_command("schedule", "Schedule an event")
            .with_command("cancel", "Cancel an event")
    }

    #[test]
    fn load_then_unload_round_trips_state() {
        let mut registry = ModuleRegistry::default();
        registry.load(events()).unwrap();
        assert!(registry.is_loaded("events"));
        assert_eq!(registry.owner_of("cancel"), Some("events"));

        let removed = registry.unload("events").unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.state("events"), Some(&ModuleState::Unloaded));
        assert!(registry.loaded_module_names().is_empty());
        assert!(registry.known_module_names().contains("events"));
    }

    #[test]
    fn load_twice_fails() {
        let mut registry = ModuleRegistry::default();
        registry.load(events()).unwrap();
        let err = registry.load(events()).unwrap_err();
        assert!(matches!(err, Error::AlreadyLoaded { name } if name == "events"));
    }

    #[test]
    fn reload_after_unload_succeeds() {
        let mut registry = ModuleRegistry::default();
        registry.load(events()).unwrap();
        registry.unload("events").unwrap();
        registry.load(events()).unwrap();
        assert!(registry.is_loaded("events"));
    }

    #[test]
    fn unload_unknown_fails() {
        let mut registry = ModuleRegistry::default();
        let err = registry.unload("gw2").unwrap_err();
        assert!(matches!(err, Error::NotLoaded { .. }));
    }

    #[test]
    fn commands_of_requires_loaded_module() {
        let mut registry = ModuleRegistry::default();
        assert!(registry.commands_of("events").is_err());

        registry.load(events()).unwrap();
        let names: Vec<_> = registry
            .commands_of("events")
            .unwrap()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["schedule", "cancel"]);
    }

    #[test]
    fn duplicate_names_within_module_rejected() {
        let mut registry = ModuleRegistry::default();
        let module = Module::new("events").command("schedule").command("schedule");
        let err = registry.load(module).unwrap_err();
        assert!(matches!(err, Error::DuplicateCommand { command, .. } if command == "schedule"));
        assert!(!registry.is_loaded("events"));
    }

    #[test]
    fn names_shared_with_other_module_rejected() {
        let mut registry = ModuleRegistry::default();
        registry.load(events()).unwrap();
        let err = registry
            .load(Module::new("raids").command("cancel"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateCommand { existing, .. } if existing == "events"));
    }

    #[test]
    fn from_commands_rehomes_descriptors() {
        let module = Module::from_commands(
            "events",
            vec![CommandDescriptor::new("schedule", "somewhere-else")],
        );
        assert_eq!(module.commands()[0].module, "events");
    }

    #[test]
    fn snapshot_matches_modules_by_remote_names() {
        let mut registry = ModuleRegistry::default();
        registry
            .load(Module::new("general").command("module"))
            .unwrap();
        registry.load(events()).unwrap();
        registry.load(Module::new("raids").command("raid")).unwrap();

        let snapshot = registry.snapshot();
        let matched = snapshot.modules_matching(&["cancel", "module", "stale"]);
        assert_eq!(
            matched,
            BTreeSet::from(["events".to_string(), "general".to_string()])
        );

        let desired = snapshot.desired_for(["events"]);
        assert_eq!(desired.name_set(), BTreeSet::from(["cancel".to_string(), "schedule".to_string()]));
        assert_eq!(snapshot.global_desired().name_set(), BTreeSet::from(["module".to_string()]));
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let mut registry = ModuleRegistry::default();
        registry.load(events()).unwrap();
        let snapshot = registry.snapshot();
        registry.unload("events").unwrap();

        assert!(snapshot.is_loaded("events"));
        assert_eq!(snapshot.commands_of("events").unwrap().len(), 2);
    }
}
