//! Module, session and manifest fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cmdtree_core::{Module, ModuleRegistry, RegistrySession, RemoteTreeClient, MANIFEST_FILE};

/// Build a module with the given command names.
pub fn module(name: &str, commands: &[&str]) -> Module {
    commands
        .iter()
        .fold(Module::new(name), |module, command| module.command(*command))
}

/// The `events` module: `schedule` and `cancel`.
pub fn events_module() -> Module {
    Module::new("events")
        .with_command("schedule", "Schedule an event")
        .with_command("cancel", "Cancel an event")
}

/// The always-on `general` module: `module` and `dev`.
pub fn general_module() -> Module {
    Module::new("general")
        .with_command("module", "Manage modules")
        .with_command("dev", "Development commands")
}

/// A session over `client` with the given modules loaded.
///
/// # Panics
/// Panics if a module fails to load.
pub fn session_with(client: Arc<dyn RemoteTreeClient>, modules: Vec<Module>) -> RegistrySession {
    let mut registry = ModuleRegistry::default();
    for module in modules {
        let name = module.name().to_string();
        registry
            .load(module)
            .unwrap_or_else(|e| panic!("session_with: failed to load {name}: {e}"));
    }
    RegistrySession::new(registry, client)
}

/// A manifest with `general` (always on), `events` (autoload) and `gw2`.
pub const SAMPLE_MANIFEST: &str = r#"[core]
always_on = "general"
concurrency = 2
state = "tree.json"

[guilds]
managed = [123]
copy_global = [999]

[modules.general]
commands = [
    { name = "module", description = "Manage modules" },
    { name = "dev", description = "Development commands" },
]

[modules.events]
autoload = true
commands = [
    { name = "schedule", description = "Schedule an event" },
    { name = "cancel", description = "Cancel an event" },
]

[modules.gw2]
commands = [{ name = "build", description = "Share a build" }]
"#;

/// Write `content` as the manifest file in `dir`, returning its path.
///
/// # Panics
/// Panics if the file cannot be written.
pub fn write_manifest(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join(MANIFEST_FILE);
    fs::write(&path, content)
        .unwrap_or_else(|e| panic!("write_manifest: failed to write {}: {e}", path.display()));
    path
}
