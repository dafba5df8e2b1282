//! Command descriptors and desired sets

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A registrable command.
///
/// Equality, ordering and hashing use `name` only; names are compared
/// case-sensitively. `description` is the content an upsert may override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Command name, unique within a scope
    pub name: String,
    /// Name of the module that contributes this command
    pub module: String,
    /// Human-readable description shown by the platform
    #[serde(default)]
    pub description: String,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Compare every field, not just the name.
    pub fn same_content(&self, other: &CommandDescriptor) -> bool {
        self.name == other.name
            && self.module == other.module
            && self.description == other.description
    }
}

impl PartialEq for CommandDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CommandDescriptor {}

impl Hash for CommandDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for CommandDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CommandDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// The set of commands that should exist in a scope, keyed by name.
///
/// Inserting a descriptor whose name is already present replaces it, so a
/// desired set never carries two commands with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredSet {
    commands: BTreeMap<String, CommandDescriptor>,
}

impl DesiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor, returning the one it replaced.
    pub fn insert(&mut self, descriptor: CommandDescriptor) -> Option<CommandDescriptor> {
        self.commands.insert(descriptor.name.clone(), descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn name_set(&self) -> BTreeSet<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromIterator<CommandDescriptor> for DesiredSet {
    fn from_iter<I: IntoIterator<Item = CommandDescriptor>>(iter: I) -> Self {
        let mut set = DesiredSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<CommandDescriptor> for DesiredSet {
    fn extend<I: IntoIterator<Item = CommandDescriptor>>(&mut self, iter: I) {
        for descriptor in iter {
            self.insert(descriptor);
        }
    }
}

impl<'a> IntoIterator for &'a DesiredSet {
    type Item = &'a CommandDescriptor;
    type IntoIter = std::collections::btree_map::Values<'a, String, CommandDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn descriptors_compare_by_name_only() {
        let a = CommandDescriptor::new("ping", "general").with_description("Pong");
        let b = CommandDescriptor::new("ping", "events");
        assert_eq!(a, b);
        assert!(!a.same_content(&b));

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_ne!(
            CommandDescriptor::new("Ping", "general"),
            CommandDescriptor::new("ping", "general")
        );
    }

    #[test]
    fn desired_set_replaces_duplicate_names() {
        let mut desired = DesiredSet::new();
        assert!(desired.insert(CommandDescriptor::new("cancel", "events")).is_none());
        let replaced = desired.insert(CommandDescriptor::new("cancel", "events").with_description("v2"));

        assert!(replaced.is_some());
        assert_eq!(desired.len(), 1);
        assert_eq!(desired.get("cancel").unwrap().description, "v2");
    }

    #[test]
    fn desired_set_iterates_in_name_order() {
        let desired: DesiredSet = ["schedule", "cancel", "list"]
            .into_iter()
            .map(|name| CommandDescriptor::new(name, "events"))
            .collect();
        let names: Vec<&str> = desired.names().collect();
        assert_eq!(names, vec!["cancel", "list", "schedule"]);
    }
}
