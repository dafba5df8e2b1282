//! On-disk tree state
//!
//! The state file is JSON:
//!
//! ```json
//! {
//!   "version": 1,
//!   "scopes": {
//!     "global": { "published": { ... }, "working": { ... } },
//!     "guild:123": { "published": { ... }, "working": { ... } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use cmdtree_core::{CommandDescriptor, GuildId, Scope};
use serde::{Deserialize, Serialize};

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

/// Commands of one scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeTree {
    /// What end users see
    #[serde(default)]
    pub published: BTreeMap<String, CommandDescriptor>,
    /// What the next commit publishes
    #[serde(default)]
    pub working: BTreeMap<String, CommandDescriptor>,
}

impl ScopeTree {
    /// Whether the working tree differs from the published one.
    pub fn has_pending(&self) -> bool {
        self.published.len() != self.working.len()
            || self
                .published
                .values()
                .zip(self.working.values())
                .any(|(published, working)| !published.same_content(working))
    }

    pub fn commit(&mut self) {
        self.published = self.working.clone();
    }
}

/// Every scope's command tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeState {
    pub version: u32,
    #[serde(default)]
    pub scopes: BTreeMap<Scope, ScopeTree>,
}

impl Default for TreeState {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            scopes: BTreeMap::new(),
        }
    }

    pub fn scope(&self, scope: Scope) -> Option<&ScopeTree> {
        self.scopes.get(&scope)
    }

    pub fn scope_mut(&mut self, scope: Scope) -> &mut ScopeTree {
        self.scopes.entry(scope).or_default()
    }

    /// Guilds that have ever held a command, in id order.
    pub fn known_guilds(&self) -> Vec<GuildId> {
        self.scopes.keys().filter_map(Scope::guild_id).collect()
    }
}
