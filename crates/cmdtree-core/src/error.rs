//! Error types for cmdtree-core

use std::path::PathBuf;

use crate::remote::RemoteError;
use crate::scope::Scope;

/// Result type for cmdtree-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cmdtree-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A module with the same name is already loaded
    #[error("Module already loaded: {name}")]
    AlreadyLoaded { name: String },

    /// The module is not currently loaded
    #[error("Module not loaded: {name}")]
    NotLoaded { name: String },

    /// The module is not declared anywhere this process knows about
    #[error("Unknown module: {name}")]
    UnknownModule { name: String },

    /// A command name is contributed twice
    #[error("Duplicate command '{command}' in module {module} (already provided by {existing})")]
    DuplicateCommand {
        module: String,
        command: String,
        existing: String,
    },

    /// Guild-specific commands shadow global commands in the same guild
    #[error("Commands in {scope} collide with global commands: {}", names.join(", "))]
    ScopeCollision { scope: Scope, names: Vec<String> },

    /// A scope string could not be parsed
    #[error("Invalid scope: {input}")]
    InvalidScope { input: String },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration is syntactically valid but semantically wrong
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A remote call failed outside of a sync
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A sync call aborted
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    /// Whether the failure is a local module problem rather than a remote one.
    pub fn is_module_problem(&self) -> bool {
        matches!(
            self,
            Error::AlreadyLoaded { .. }
                | Error::NotLoaded { .. }
                | Error::UnknownModule { .. }
                | Error::DuplicateCommand { .. }
                | Error::ScopeCollision { .. }
        )
    }

    /// Whether the failure came from the remote platform.
    pub fn is_remote_problem(&self) -> bool {
        matches!(self, Error::Remote(_) | Error::Sync(_))
    }

    /// Whether repeating the identical call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Sync(err) => err.is_retryable(),
            Error::Remote(err) => err.transient,
            _ => false,
        }
    }
}

/// Failure of a single `sync` call.
///
/// `Partial` leaves the scope with some staged adds/removes and no commit;
/// repeating the identical call converges. `Fatal` wraps a permanent remote
/// error and must be surfaced to an operator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error(
        "Sync of {scope} aborted after {applied_adds} add(s) and {applied_removes} removal(s): {cause}"
    )]
    Partial {
        scope: Scope,
        applied_adds: usize,
        applied_removes: usize,
        #[source]
        cause: RemoteError,
    },

    #[error("Sync of {scope} failed permanently: {cause}")]
    Fatal {
        scope: Scope,
        #[source]
        cause: RemoteError,
    },
}

impl SyncError {
    /// Classify a remote failure that interrupted a sync of `scope`.
    pub fn from_remote(
        scope: Scope,
        applied_adds: usize,
        applied_removes: usize,
        cause: RemoteError,
    ) -> Self {
        if cause.transient {
            SyncError::Partial {
                scope,
                applied_adds,
                applied_removes,
                cause,
            }
        } else {
            SyncError::Fatal { scope, cause }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Partial { .. })
    }

    pub fn scope(&self) -> Scope {
        match self {
            SyncError::Partial { scope, .. } | SyncError::Fatal { scope, .. } => *scope,
        }
    }

    pub fn cause(&self) -> &RemoteError {
        match self {
            SyncError::Partial { cause, .. } | SyncError::Fatal { cause, .. } => cause,
        }
    }
}
