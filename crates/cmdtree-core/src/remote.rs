//! Remote command tree interface
//!
//! [`RemoteTreeClient`] is the only network boundary the core depends on.
//! Any platform offering list/upsert/remove/commit per scope satisfies it.

use async_trait::async_trait;

use crate::command::CommandDescriptor;
use crate::scope::Scope;

/// Result type for remote tree operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Failure reported by the remote platform.
///
/// `transient` failures (rate limits, timeouts) may be retried with
/// backoff. Permanent failures (a malformed descriptor) must be surfaced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} remote error: {message}", kind_label(.transient))]
pub struct RemoteError {
    pub transient: bool,
    pub message: String,
}

fn kind_label(transient: &bool) -> &'static str {
    if *transient { "transient" } else { "permanent" }
}

impl RemoteError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            transient: false,
            message: message.into(),
        }
    }
}

/// Client for a remote, scoped command tree.
///
/// Adds and removals are staged per scope and become visible to end users
/// only on [`commit`](RemoteTreeClient::commit). [`list`](RemoteTreeClient::list)
/// reports the scope's working tree, i.e. what the next commit would publish.
#[async_trait]
pub trait RemoteTreeClient: Send + Sync {
    /// Names of the commands currently present in `scope`.
    async fn list(&self, scope: Scope) -> RemoteResult<Vec<String>>;

    /// Add or override a command. Upserting an identical descriptor is a
    /// no-op success.
    async fn upsert(&self, scope: Scope, descriptor: &CommandDescriptor) -> RemoteResult<()>;

    /// Remove a command by name, reporting whether anything was removed.
    async fn remove(&self, scope: Scope, name: &str) -> RemoteResult<bool>;

    /// Publish the scope's staged changes as one logical operation.
    async fn commit(&self, scope: Scope) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        assert_eq!(
            RemoteError::transient("429 Too Many Requests").to_string(),
            "transient remote error: 429 Too Many Requests"
        );
        assert_eq!(
            RemoteError::permanent("invalid name").to_string(),
            "permanent remote error: invalid name"
        );
    }
}
