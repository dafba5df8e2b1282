//! Error types for cmdtree-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from cmdtree-core
    #[error(transparent)]
    Core(#[from] cmdtree_core::Error),

    /// Error from cmdtree-store
    #[error(transparent)]
    Store(#[from] cmdtree_store::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Short label for the kind of failure, shown after the message.
    pub fn category(&self) -> Option<&'static str> {
        match self {
            CliError::Core(e) if e.is_module_problem() => Some("module problem"),
            CliError::Core(e) if e.is_remote_problem() => Some("remote problem"),
            CliError::Store(_) => Some("remote problem"),
            _ => None,
        }
    }
}
