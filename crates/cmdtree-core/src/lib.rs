//! Command registry and scoped synchronization engine
//!
//! This crate keeps a remote, scoped slash-command tree consistent with the
//! modules loaded in the local process:
//!
//! - **ModuleRegistry**: which modules are loaded and the commands each contributes
//! - **RemoteTreeClient**: the list/upsert/remove/commit boundary to the platform
//! - **SyncEngine**: diff and apply one scope, adds before removals before commit
//! - **ReconciliationController**: rebuild per-guild desired state at startup
//!
//! # Architecture
//!
//! ```text
//!              admin surface (cmdtree-cli)
//!                         |
//!                  RegistrySession
//!                  /              \
//!       ModuleRegistry        SyncEngine ---- RemoteTreeClient
//!                  \              /
//!             ReconciliationController
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cmdtree_core::{Module, ModuleRegistry, RegistrySession, Scope, SyncMode};
//!
//! async fn example(client: std::sync::Arc<dyn cmdtree_core::RemoteTreeClient>) -> cmdtree_core::Result<()> {
//!     let session = RegistrySession::new(ModuleRegistry::default(), client);
//!     session.load_module(Module::new("events").command("schedule").command("cancel"))?;
//!     let desired = session.commands_of("events")?;
//!     let report = session.sync(Scope::guild(123), &desired, &SyncMode::Replace).await?;
//!     assert_eq!(report.added, 2);
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod remote;
pub mod scope;
pub mod session;
pub mod sync;

pub use command::{CommandDescriptor, DesiredSet};
pub use config::{Manifest, MANIFEST_FILE};
pub use error::{Error, Result, SyncError};
pub use reconcile::{
    ReconcileOutcome, ReconcileSummary, ReconciliationController, RetryPolicy, ScopeFailure,
};
pub use registry::{Module, ModuleRegistry, ModuleState, RegistrySnapshot, SharedRegistry};
pub use remote::{RemoteError, RemoteResult, RemoteTreeClient};
pub use scope::{GuildId, Scope};
pub use session::RegistrySession;
pub use sync::{SyncEngine, SyncMode, SyncOptions, SyncPlan, SyncReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_not_loaded_displays_module_name() {
        let error = Error::NotLoaded {
            name: "gw2".to_string(),
        };

        let display = format!("{}", error);
        assert!(
            display.contains("gw2"),
            "Error display should contain the module name, got: {}",
            display
        );
        assert!(
            display.to_lowercase().contains("not loaded"),
            "Error display should mention not loaded, got: {}",
            display
        );
    }
}
