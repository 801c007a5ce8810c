use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{EngineError, Result};

/// One entry as reported by a hierarchy source.
///
/// The engine never owns file content; this is the full shape it depends on.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub path: PathBuf,
    pub name: String,
    pub is_container: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl EntryInfo {
    /// Derive the display name from the last path component.
    pub fn name_of(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string())
    }
}

/// A mutation notice delivered by the host's change-notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeNotice {
    Created(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl ChangeNotice {
    /// The path whose ancestor chain is affected by this notice.
    pub fn path(&self) -> &Path {
        match self {
            ChangeNotice::Created(p) | ChangeNotice::Deleted(p) => p,
            ChangeNotice::Renamed { to, .. } => to,
        }
    }
}

/// Read-only provider of the folder/file hierarchy.
///
/// Listings are synchronous and in-memory; the engine never blocks on I/O
/// through this trait. `children` may fail with `SourceUnavailable` when a
/// container becomes unreadable mid-pass; the tree builder recovers by
/// treating it as empty.
pub trait HierarchySource {
    /// The true root of the hierarchy.
    fn root(&self) -> PathBuf;

    /// Resolve a single entry, or `None` if the path no longer exists.
    fn entry(&self, path: &Path) -> Option<EntryInfo>;

    /// List the direct children of a container.
    fn children(&self, path: &Path) -> Result<Vec<EntryInfo>>;
}

/// In-memory hierarchy source.
///
/// Used by tests and by hosts that already hold their vault index in memory.
/// Paths are relative to the root entry (e.g. `root/A/x.md`).
#[derive(Debug, Default)]
pub struct MemorySource {
    root: PathBuf,
    entries: HashMap<PathBuf, EntryInfo>,
}

impl MemorySource {
    /// Create an empty source whose root container is `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut entries = HashMap::new();
        entries.insert(
            root.clone(),
            EntryInfo {
                name: EntryInfo::name_of(&root),
                path: root.clone(),
                is_container: true,
                size: 0,
                modified: None,
            },
        );
        Self { root, entries }
    }

    /// Register a folder entry.
    pub fn add_folder(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        let path = path.into();
        self.entries.insert(
            path.clone(),
            EntryInfo {
                name: EntryInfo::name_of(&path),
                path,
                is_container: true,
                size: 0,
                modified: None,
            },
        );
        self
    }

    /// Register a file entry with metadata.
    pub fn add_file(
        &mut self,
        path: impl Into<PathBuf>,
        size: u64,
        modified: Option<SystemTime>,
    ) -> &mut Self {
        let path = path.into();
        self.entries.insert(
            path.clone(),
            EntryInfo {
                name: EntryInfo::name_of(&path),
                path,
                is_container: false,
                size,
                modified,
            },
        );
        self
    }

    /// Remove an entry and everything below it.
    pub fn remove(&mut self, path: &Path) {
        self.entries
            .retain(|p, _| !(p == path || p.starts_with(path)));
    }
}

impl HierarchySource for MemorySource {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    fn entry(&self, path: &Path) -> Option<EntryInfo> {
        self.entries.get(path).cloned()
    }

    fn children(&self, path: &Path) -> Result<Vec<EntryInfo>> {
        if !self.entries.contains_key(path) {
            return Err(EngineError::SourceUnavailable(path.to_path_buf()));
        }
        Ok(self
            .entries
            .values()
            .filter(|e| e.path.parent() == Some(path))
            .cloned()
            .collect())
    }
}

/// Filesystem-backed hierarchy source.
///
/// Adapter over `std::fs` for hosts (and the `vtree` binary) that navigate a
/// real directory. Unreadable entries are skipped rather than failing the
/// listing.
#[derive(Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let meta = fs::metadata(&root)?;
        if !meta.is_dir() {
            return Err(EngineError::InvalidFocusTarget(root));
        }
        Ok(Self { root })
    }

    fn entry_from_fs(path: &Path) -> Option<EntryInfo> {
        let metadata = fs::symlink_metadata(path).ok()?;
        Some(EntryInfo {
            name: EntryInfo::name_of(path),
            path: path.to_path_buf(),
            is_container: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

impl HierarchySource for FsSource {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    fn entry(&self, path: &Path) -> Option<EntryInfo> {
        Self::entry_from_fs(path)
    }

    fn children(&self, path: &Path) -> Result<Vec<EntryInfo>> {
        let entries = fs::read_dir(path)
            .map_err(|_| EngineError::SourceUnavailable(path.to_path_buf()))?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if let Some(info) = Self::entry_from_fs(&entry.path()) {
                children.push(info);
            }
        }
        Ok(children)
    }
}
