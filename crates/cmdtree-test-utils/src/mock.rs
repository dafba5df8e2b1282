//! [`MockTree`]: an in-memory [`RemoteTreeClient`] for tests.
//!
//! Each scope keeps a published tree (what end users see) and a working tree
//! (what the next commit publishes). `list` reports the working tree. Every
//! call is recorded, and failures can be scheduled for the n-th call of a
//! given operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cmdtree_core::{CommandDescriptor, RemoteError, RemoteResult, RemoteTreeClient, Scope};

/// Remote operation kinds, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Upsert,
    Remove,
    Commit,
}

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(Scope),
    Upsert(Scope, String),
    Remove(Scope, String),
    Commit(Scope),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::List(_) => Op::List,
            Call::Upsert(..) => Op::Upsert,
            Call::Remove(..) => Op::Remove,
            Call::Commit(_) => Op::Commit,
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, Call::List(_))
    }
}

#[derive(Debug, Clone, Default)]
struct ScopeTree {
    published: BTreeMap<String, CommandDescriptor>,
    working: BTreeMap<String, CommandDescriptor>,
}

#[derive(Debug)]
struct Fault {
    op: Op,
    remaining: usize,
    error: RemoteError,
}

#[derive(Debug, Default)]
struct State {
    scopes: HashMap<Scope, ScopeTree>,
    calls: Vec<Call>,
    faults: Vec<Fault>,
}

impl State {
    /// Record the call and return the scheduled failure, if this is it.
    fn enter(&mut self, call: Call) -> RemoteResult<()> {
        let op = call.op();
        self.calls.push(call);

        for fault in self.faults.iter_mut().filter(|f| f.op == op) {
            fault.remaining = fault.remaining.saturating_sub(1);
        }
        let triggered = self
            .faults
            .iter()
            .position(|f| f.op == op && f.remaining == 0);
        match triggered {
            Some(index) => Err(self.faults.remove(index).error),
            None => Ok(()),
        }
    }

    fn tree(&mut self, scope: Scope) -> &mut ScopeTree {
        self.scopes.entry(scope).or_default()
    }
}

/// In-memory remote command tree
#[derive(Debug, Default)]
pub struct MockTree {
    state: Mutex<State>,
}

impl MockTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `scope` with published commands that no module owns.
    pub fn with_commands(self, scope: Scope, names: &[&str]) -> Self {
        {
            let mut state = self.lock();
            let tree = state.tree(scope);
            for name in names {
                let descriptor = CommandDescriptor::new(*name, "remote");
                tree.published.insert(name.to_string(), descriptor.clone());
                tree.working.insert(name.to_string(), descriptor);
            }
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the `nth` (1-based, counted from now) call of `op` with `error`.
    pub fn fail_nth(&self, op: Op, nth: usize, error: RemoteError) {
        assert!(nth > 0, "nth is 1-based");
        self.lock().faults.push(Fault {
            op,
            remaining: nth,
            error,
        });
    }

    /// Fail the next call of `op` with `error`.
    pub fn fail_next(&self, op: Op, error: RemoteError) {
        self.fail_nth(op, 1, error);
    }

    /// Drop every scheduled failure that has not fired yet.
    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Working-tree names of `scope`, sorted.
    pub fn names(&self, scope: Scope) -> Vec<String> {
        self.lock()
            .scopes
            .get(&scope)
            .map(|tree| tree.working.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Published names of `scope`, sorted.
    pub fn published(&self, scope: Scope) -> Vec<String> {
        self.lock()
            .scopes
            .get(&scope)
            .map(|tree| tree.published.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Published descriptor for `name` in `scope`.
    pub fn descriptor(&self, scope: Scope, name: &str) -> Option<CommandDescriptor> {
        self.lock()
            .scopes
            .get(&scope)
            .and_then(|tree| tree.published.get(name).cloned())
    }

    /// Whether `scope` has staged changes not yet committed.
    pub fn has_pending(&self, scope: Scope) -> bool {
        self.lock().scopes.get(&scope).is_some_and(|tree| {
            tree.published.len() != tree.working.len()
                || tree
                    .published
                    .iter()
                    .zip(tree.working.iter())
                    .any(|((a, da), (b, db))| a != b || !da.same_content(db))
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_mutating()).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[async_trait]
impl RemoteTreeClient for MockTree {
    async fn list(&self, scope: Scope) -> RemoteResult<Vec<String>> {
        let mut state = self.lock();
        state.enter(Call::List(scope))?;
        Ok(state.tree(scope).working.keys().cloned().collect())
    }

    async fn upsert(&self, scope: Scope, descriptor: &CommandDescriptor) -> RemoteResult<()> {
        let mut state = self.lock();
        state.enter(Call::Upsert(scope, descriptor.name.clone()))?;
        state
            .tree(scope)
            .working
            .insert(descriptor.name.clone(), descriptor.clone());
        Ok(())
    }

    async fn remove(&self, scope: Scope, name: &str) -> RemoteResult<bool> {
        let mut state = self.lock();
        state.enter(Call::Remove(scope, name.to_string()))?;
        Ok(state.tree(scope).working.remove(name).is_some())
    }

    async fn commit(&self, scope: Scope) -> RemoteResult<()> {
        let mut state = self.lock();
        state.enter(Call::Commit(scope))?;
        let tree = state.tree(scope);
        tree.published = tree.working.clone();
        Ok(())
    }
}
