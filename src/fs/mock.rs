// src/fs/mock.rs

use super::{EventKey, FileRef, FileSystemId, IdentityResolver};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockState {
    remote: HashSet<FileSystemId>,
    unresolvable: HashSet<FileSystemId>,
    /// Alias path -> canonical path, e.g. a symlink and its target.
    aliases: HashMap<PathBuf, PathBuf>,
    placeholders: Vec<PathBuf>,
}

/// In-memory resolver for tests.
///
/// Paths are used verbatim as keys unless an alias was registered for them.
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    state: Arc<Mutex<MockState>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remote(&self, filesystem: &FileSystemId, remote: bool) {
        let mut state = self.state.lock().unwrap();
        if remote {
            state.remote.insert(filesystem.clone());
        } else {
            state.remote.remove(filesystem);
        }
    }

    pub fn set_unresolvable(&self, filesystem: &FileSystemId) {
        let mut state = self.state.lock().unwrap();
        state.unresolvable.insert(filesystem.clone());
    }

    pub fn add_alias(&self, alias: impl AsRef<Path>, canonical: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.aliases.insert(
            alias.as_ref().to_path_buf(),
            canonical.as_ref().to_path_buf(),
        );
    }

    /// Paths for which a placeholder reference was synthesized, in order.
    pub fn placeholders(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().placeholders.clone()
    }
}

impl IdentityResolver for MockResolver {
    fn key_for(&self, file: &FileRef) -> EventKey {
        let state = self.state.lock().unwrap();
        let path = state
            .aliases
            .get(file.path())
            .cloned()
            .unwrap_or_else(|| file.path().to_path_buf());
        EventKey::new(file.filesystem().clone(), path)
    }

    fn is_remote(&self, file: &FileRef) -> Option<bool> {
        let state = self.state.lock().unwrap();
        if state.unresolvable.contains(file.filesystem()) {
            return None;
        }
        Some(state.remote.contains(file.filesystem()))
    }

    fn placeholder_for(&self, filesystem: &FileSystemId, path: &Path) -> FileRef {
        self.state
            .lock()
            .unwrap()
            .placeholders
            .push(path.to_path_buf());
        FileRef::invalid(filesystem.clone(), path)
    }
}
