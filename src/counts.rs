use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::source::{ChangeNotice, HierarchySource};

/// Cached counts for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderCounts {
    /// Direct file children.
    pub file_count: usize,
    /// Direct folder children.
    pub folder_count: usize,
    /// Direct children of either kind.
    pub total_items: usize,
    pub recursive_file_count: usize,
    pub recursive_folder_count: usize,
    pub last_updated: SystemTime,
    /// False when the entry was produced by a budget-bounded or failed scan
    /// and may undercount.
    pub is_complete: bool,
}

/// Recursive item-count index over the hierarchy source.
///
/// Built in a single bottom-up pass; mutation notices recompute only the
/// affected path and its ancestor chain, never the whole tree.
#[derive(Debug, Default)]
pub struct FolderCountCache {
    entries: HashMap<PathBuf, FolderCounts>,
}

impl FolderCountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&FolderCounts> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full bottom-up recomputation from `root`.
    pub fn compute<S: HierarchySource>(&mut self, source: &S, root: &Path) {
        self.compute_budgeted(source, root, None);
    }

    /// Bottom-up recomputation visiting at most `budget` containers.
    ///
    /// When the budget runs out, entries along the interrupted paths are
    /// marked `is_complete = false` so callers can tell partial counts from
    /// resolved ones.
    pub fn compute_budgeted<S: HierarchySource>(
        &mut self,
        source: &S,
        root: &Path,
        budget: Option<usize>,
    ) {
        let mut remaining = budget;
        self.compute_node(source, root, &mut remaining);
        debug!(root = %root.display(), entries = self.entries.len(), "count pass");
    }

    /// Returns (recursive files, recursive folders, complete).
    fn compute_node<S: HierarchySource>(
        &mut self,
        source: &S,
        path: &Path,
        remaining: &mut Option<usize>,
    ) -> (usize, usize, bool) {
        if let Some(r) = remaining {
            if *r == 0 {
                return (0, 0, false);
            }
            *r -= 1;
        }

        let children = match source.children(path) {
            Ok(c) => c,
            Err(_) => {
                self.insert_zero(path, false);
                return (0, 0, false);
            }
        };

        let file_count = children.iter().filter(|c| !c.is_container).count();
        let folder_count = children.len() - file_count;

        let mut recursive_file_count = file_count;
        let mut recursive_folder_count = folder_count;
        let mut is_complete = true;

        for child in children.iter().filter(|c| c.is_container) {
            let (f, d, complete) = self.compute_node(source, &child.path, remaining);
            recursive_file_count += f;
            recursive_folder_count += d;
            is_complete &= complete;
        }

        self.entries.insert(
            path.to_path_buf(),
            FolderCounts {
                file_count,
                folder_count,
                total_items: children.len(),
                recursive_file_count,
                recursive_folder_count,
                last_updated: SystemTime::now(),
                is_complete,
            },
        );
        (recursive_file_count, recursive_folder_count, is_complete)
    }

    fn insert_zero(&mut self, path: &Path, is_complete: bool) {
        self.entries.insert(
            path.to_path_buf(),
            FolderCounts {
                file_count: 0,
                folder_count: 0,
                total_items: 0,
                recursive_file_count: 0,
                recursive_folder_count: 0,
                last_updated: SystemTime::now(),
                is_complete,
            },
        );
    }

    /// Apply one mutation notice: recompute the affected subtree (for
    /// creates/renames) and the ancestor chain up to `root`, reusing cached
    /// counts for untouched siblings.
    pub fn apply_notice<S: HierarchySource>(
        &mut self,
        source: &S,
        notice: &ChangeNotice,
        root: &Path,
    ) {
        match notice {
            ChangeNotice::Created(path) => {
                if source.entry(path).map(|e| e.is_container).unwrap_or(false) {
                    self.compute(source, path);
                }
                self.refresh_ancestors(source, path, root);
            }
            ChangeNotice::Deleted(path) => {
                self.remove_subtree(path);
                self.refresh_ancestors(source, path, root);
            }
            ChangeNotice::Renamed { from, to } => {
                self.remove_subtree(from);
                if source.entry(to).map(|e| e.is_container).unwrap_or(false) {
                    self.compute(source, to);
                }
                self.refresh_ancestors(source, from, root);
                self.refresh_ancestors(source, to, root);
            }
        }
    }

    fn remove_subtree(&mut self, path: &Path) {
        self.entries
            .retain(|p, _| !(p == path || p.starts_with(path)));
    }

    /// Recompute the chain from `path`'s parent up to and including `root`,
    /// shallowly: direct counts are re-listed, recursive counts reuse the
    /// cached entries of child containers.
    fn refresh_ancestors<S: HierarchySource>(&mut self, source: &S, path: &Path, root: &Path) {
        for ancestor in path.ancestors().skip(1) {
            self.recompute_shallow(source, ancestor);
            if ancestor == root {
                break;
            }
        }
    }

    fn recompute_shallow<S: HierarchySource>(&mut self, source: &S, path: &Path) {
        let children = match source.children(path) {
            Ok(c) => c,
            Err(_) => {
                self.insert_zero(path, false);
                return;
            }
        };

        let file_count = children.iter().filter(|c| !c.is_container).count();
        let folder_count = children.len() - file_count;

        let mut recursive_file_count = file_count;
        let mut recursive_folder_count = folder_count;
        let mut is_complete = true;

        for child in children.iter().filter(|c| c.is_container) {
            match self.entries.get(&child.path) {
                Some(entry) => {
                    recursive_file_count += entry.recursive_file_count;
                    recursive_folder_count += entry.recursive_folder_count;
                    is_complete &= entry.is_complete;
                }
                None => is_complete = false,
            }
        }

        self.entries.insert(
            path.to_path_buf(),
            FolderCounts {
                file_count,
                folder_count,
                total_items: children.len(),
                recursive_file_count,
                recursive_folder_count,
                last_updated: SystemTime::now(),
                is_complete,
            },
        );
    }
}
