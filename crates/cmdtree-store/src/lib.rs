//! File-backed remote command tree
//!
//! [`FileTree`] implements [`cmdtree_core::RemoteTreeClient`] over a JSON
//! state file, so the admin CLI can stage, commit and inspect command trees
//! across invocations without a live platform connection.

pub mod error;
pub mod state;
pub mod tree;

pub use error::{Error, Result};
pub use state::{ScopeTree, TreeState, STATE_VERSION};
pub use tree::FileTree;
