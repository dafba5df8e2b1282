//! [`FileTree`]: a [`RemoteTreeClient`] persisted to a local JSON file.
//!
//! Every operation takes an advisory lock on a sibling `.lock` file, reads
//! the state, and for mutations writes it back with write-to-temp-then-rename.
//! The lock lives on a separate file because the rename replaces the state
//! file's inode. Blocking file work runs on tokio's blocking pool.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cmdtree_core::{
    CommandDescriptor, GuildId, RemoteError, RemoteResult, RemoteTreeClient, Scope,
};
use fs2::FileExt;

use crate::state::{TreeState, STATE_VERSION};
use crate::{Error, Result};

/// File-backed command tree
#[derive(Debug, Clone)]
pub struct FileTree {
    path: PathBuf,
}

impl FileTree {
    /// Use `path` as the state file, creating its parent directory.
    ///
    /// The file itself is created by the first mutation; until then every
    /// scope reads as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn lock(&self, exclusive: bool) -> Result<File> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::io(&lock_path, e))?;
        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        };
        locked.map_err(|_| Error::LockFailed {
            path: self.path.clone(),
        })?;
        Ok(file)
    }

    fn read_unlocked(&self) -> Result<TreeState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TreeState::new()),
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        let state: TreeState = serde_json::from_str(&content).map_err(|source| Error::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        if state.version != STATE_VERSION {
            return Err(Error::UnsupportedVersion {
                path: self.path.clone(),
                found: state.version,
            });
        }
        Ok(state)
    }

    fn write_unlocked(&self, state: &TreeState) -> Result<()> {
        let content = serde_json::to_string_pretty(state).map_err(|source| Error::Encode {
            path: self.path.clone(),
            source,
        })?;

        // Same directory, so the rename stays on one filesystem
        let temp_name = format!(
            ".{}.{}.tmp",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        let temp_path = self.path.with_file_name(&temp_name);

        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

        fs::rename(&temp_path, &self.path).map_err(|e| Error::io(&self.path, e))
    }

    /// Read the whole state under a shared lock.
    pub fn load(&self) -> Result<TreeState> {
        let _lock = self.lock(false)?;
        self.read_unlocked()
    }

    /// Read, modify and write back the state under an exclusive lock.
    fn update<T>(&self, f: impl FnOnce(&mut TreeState) -> T) -> Result<T> {
        let _lock = self.lock(true)?;
        let mut state = self.read_unlocked()?;
        let out = f(&mut state);
        self.write_unlocked(&state)?;
        Ok(out)
    }

    async fn blocking<T, F>(&self, f: F) -> RemoteResult<T>
    where
        T: Send + 'static,
        F: FnOnce(FileTree) -> Result<T> + Send + 'static,
    {
        let tree = self.clone();
        tokio::task::spawn_blocking(move || f(tree))
            .await
            .map_err(|e| Error::Join(e.to_string()))?
            .map_err(RemoteError::from)
    }

    /// Published names of `scope`, sorted.
    pub fn published(&self, scope: Scope) -> Result<Vec<String>> {
        Ok(self
            .load()?
            .scope(scope)
            .map(|tree| tree.published.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Working-tree names of `scope`, sorted.
    pub fn working(&self, scope: Scope) -> Result<Vec<String>> {
        Ok(self
            .load()?
            .scope(scope)
            .map(|tree| tree.working.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Published descriptor for `name` in `scope`.
    pub fn descriptor(&self, scope: Scope, name: &str) -> Result<Option<CommandDescriptor>> {
        Ok(self
            .load()?
            .scope(scope)
            .and_then(|tree| tree.published.get(name).cloned()))
    }

    /// Whether `scope` has staged changes not yet committed.
    pub fn has_pending(&self, scope: Scope) -> Result<bool> {
        Ok(self
            .load()?
            .scope(scope)
            .is_some_and(|tree| tree.has_pending()))
    }

    /// Guilds present in the state file.
    pub fn known_guilds(&self) -> Result<Vec<GuildId>> {
        Ok(self.load()?.known_guilds())
    }
}

#[async_trait]
impl RemoteTreeClient for FileTree {
    async fn list(&self, scope: Scope) -> RemoteResult<Vec<String>> {
        self.blocking(move |tree| tree.working(scope)).await
    }

    async fn upsert(&self, scope: Scope, descriptor: &CommandDescriptor) -> RemoteResult<()> {
        let descriptor = descriptor.clone();
        self.blocking(move |tree| {
            tracing::debug!(scope = %scope, command = %descriptor.name, "Staging upsert");
            tree.update(|state| {
                state
                    .scope_mut(scope)
                    .working
                    .insert(descriptor.name.clone(), descriptor);
            })
        })
        .await
    }

    async fn remove(&self, scope: Scope, name: &str) -> RemoteResult<bool> {
        let name = name.to_string();
        self.blocking(move |tree| {
            tracing::debug!(scope = %scope, command = %name, "Staging removal");
            tree.update(|state| state.scope_mut(scope).working.remove(&name).is_some())
        })
        .await
    }

    async fn commit(&self, scope: Scope) -> RemoteResult<()> {
        self.blocking(move |tree| {
            let published = tree.update(|state| {
                let scope_tree = state.scope_mut(scope);
                scope_tree.commit();
                scope_tree.published.len()
            })?;
            tracing::debug!(scope = %scope, published, "Committed scope");
            Ok(())
        })
        .await
    }
}
