// src/fs/mod.rs

//! File identity: which filesystem a reference lives on, and how references
//! turn into map keys.
//!
//! Resolving paths is the business of whoever produces raw events; the
//! coalescer only needs the three operations on [`IdentityResolver`].

use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[cfg(test)]
pub(crate) mod mock;

/// Opaque name of a filesystem (a mount, a remote host, a VFS root, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileSystemId(Arc<str>);

impl FileSystemId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a file as carried by a raw event.
///
/// `valid` is false for references to paths that no longer exist, such as the
/// placeholder synthesized for the old side of a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    filesystem: FileSystemId,
    path: PathBuf,
    valid: bool,
}

impl FileRef {
    pub fn new(filesystem: FileSystemId, path: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            path: path.into(),
            valid: true,
        }
    }

    /// Reference to a path that does not exist (anymore).
    pub fn invalid(filesystem: FileSystemId, path: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            path: path.into(),
            valid: false,
        }
    }

    pub fn filesystem(&self) -> &FileSystemId {
        &self.filesystem
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Identity of "a path on a filesystem". Both fields take part in equality
/// and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    filesystem: FileSystemId,
    path: PathBuf,
}

impl EventKey {
    pub fn new(filesystem: FileSystemId, path: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            path: path.into(),
        }
    }

    pub fn filesystem(&self) -> &FileSystemId {
        &self.filesystem
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filesystem, self.path.display())
    }
}

/// Abstract identity resolver.
pub trait IdentityResolver: Send + Sync + Debug {
    /// Key under which events for `file` are coalesced. References to the
    /// same logical file must produce equal keys.
    fn key_for(&self, file: &FileRef) -> EventKey;

    /// Whether `file` lives on a remote filesystem. `None` means the owning
    /// filesystem could not be resolved.
    fn is_remote(&self, file: &FileRef) -> Option<bool>;

    /// A "now-invalid" reference for `path` on `filesystem`.
    fn placeholder_for(&self, filesystem: &FileSystemId, path: &Path) -> FileRef;
}

/// Resolver keyed on lexically normalized paths.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    remote: HashSet<FileSystemId>,
    unresolvable: HashSet<FileSystemId>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver treating every filesystem named in `remote` as remote.
    pub fn with_remote<I, S>(remote: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            remote: remote.into_iter().map(FileSystemId::new).collect(),
            unresolvable: HashSet::new(),
        }
    }

    /// Mark a filesystem whose remoteness cannot be determined.
    pub fn mark_unresolvable(&mut self, filesystem: FileSystemId) {
        self.unresolvable.insert(filesystem);
    }
}

impl IdentityResolver for PathResolver {
    fn key_for(&self, file: &FileRef) -> EventKey {
        EventKey::new(file.filesystem().clone(), normalize_lexically(file.path()))
    }

    fn is_remote(&self, file: &FileRef) -> Option<bool> {
        let fs = file.filesystem();
        if fs.as_str().is_empty() || self.unresolvable.contains(fs) {
            return None;
        }
        Some(self.remote.contains(fs))
    }

    fn placeholder_for(&self, filesystem: &FileSystemId, path: &Path) -> FileRef {
        FileRef::invalid(filesystem.clone(), path)
    }
}

/// Drop `.` components and fold `..` into the preceding normal component
/// without touching the disk.
///
/// A leading `..` on a relative path is kept, since there is nothing to fold
/// it into; `..` directly under the root is dropped.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}
