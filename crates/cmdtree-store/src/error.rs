//! Error types for cmdtree-store

use std::path::PathBuf;

use cmdtree_core::RemoteError;

/// Result type for cmdtree-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing the tree state file
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Corrupt tree state at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode tree state for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported tree state version {found} at {path}")]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error("Background task failed: {0}")]
    Join(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Contention and I/O hiccups may clear up on retry. A state file that
/// cannot be read or written as JSON will not.
impl From<Error> for RemoteError {
    fn from(err: Error) -> Self {
        match err {
            Error::Corrupt { .. } | Error::Encode { .. } | Error::UnsupportedVersion { .. } => {
                RemoteError::permanent(err.to_string())
            }
            Error::Io { .. } | Error::LockFailed { .. } | Error::Join(_) => {
                RemoteError::transient(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_failure_is_transient() {
        let remote: RemoteError = Error::LockFailed {
            path: PathBuf::from("tree.json"),
        }
        .into();
        assert!(remote.transient);
        assert!(remote.message.contains("tree.json"));
    }

    #[test]
    fn corrupt_state_is_permanent() {
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        let remote: RemoteError = Error::Corrupt {
            path: PathBuf::from("tree.json"),
            source,
        }
        .into();
        assert!(!remote.transient);
    }

    #[test]
    fn encode_failure_is_permanent_and_not_reported_as_corrupt() {
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = Error::Encode {
            path: PathBuf::from("tree.json"),
            source,
        };
        assert!(!err.to_string().contains("Corrupt"));

        let remote: RemoteError = err.into();
        assert!(!remote.transient);
        assert!(remote.message.contains("Failed to encode"));
    }
}
