//! Diff computation between a desired set and a remote listing

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::command::{CommandDescriptor, DesiredSet};
use crate::scope::Scope;

/// How a sync treats remote names that are not desired
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Remove every remote name that is not desired
    #[default]
    Replace,
    /// Remove only the listed names, leaving every other remote name alone
    Merge { retract: BTreeSet<String> },
}

impl SyncMode {
    /// Merge that removes nothing.
    pub fn merge() -> Self {
        SyncMode::Merge {
            retract: BTreeSet::new(),
        }
    }

    /// Merge that may remove the given names if they are not desired.
    pub fn merge_retracting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SyncMode::Merge {
            retract: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn may_remove(&self, name: &str) -> bool {
        match self {
            SyncMode::Replace => true,
            SyncMode::Merge { retract } => retract.contains(name),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncMode::Replace => "replace",
            SyncMode::Merge { .. } => "merge",
        }
    }
}

/// The calls a sync would make against one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub scope: Scope,
    /// Desired commands missing from the remote listing, in name order
    pub to_add: Vec<CommandDescriptor>,
    /// Remote names to remove, in name order
    pub to_remove: Vec<String>,
    /// Desired commands already present remotely
    pub unchanged: usize,
}

impl SyncPlan {
    /// Diff `desired` against a remote listing.
    ///
    /// Comparison is by name only. Duplicate names in the listing are
    /// collapsed, so a name is never added twice and never removed twice.
    pub fn compute<S: AsRef<str>>(
        scope: Scope,
        desired: &DesiredSet,
        remote: &[S],
        mode: &SyncMode,
    ) -> Self {
        let remote: BTreeSet<&str> = remote.iter().map(AsRef::as_ref).collect();

        let to_add: Vec<CommandDescriptor> = desired
            .descriptors()
            .filter(|d| !remote.contains(d.name.as_str()))
            .cloned()
            .collect();

        let to_remove = remote
            .iter()
            .filter(|name| !desired.contains(name) && mode.may_remove(name))
            .map(|name| name.to_string())
            .collect();

        Self {
            scope,
            unchanged: desired.len() - to_add.len(),
            to_add,
            to_remove,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
