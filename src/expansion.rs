use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::source::HierarchySource;

/// Default depth bound for `expand_all`, guarding runaway memory on
/// pathological hierarchies.
pub const DEFAULT_EXPAND_ALL_DEPTH: usize = 50;

/// Per-pane set of expanded container paths.
///
/// Pure state keyed by path; knows nothing about rendering. Persisted
/// externally as a string list via `snapshot`/`restore`.
#[derive(Debug, Default, Clone)]
pub struct ExpansionState {
    expanded: HashSet<PathBuf>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the container at `path` is currently expanded.
    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.contains(path)
    }

    /// Flip membership for `path`. Returns the new state.
    pub fn toggle(&mut self, path: &Path) -> bool {
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.to_path_buf());
            true
        }
    }

    /// Mark `path` expanded.
    pub fn expand(&mut self, path: &Path) {
        self.expanded.insert(path.to_path_buf());
    }

    /// Mark `path` collapsed.
    pub fn collapse(&mut self, path: &Path) {
        self.expanded.remove(path);
    }

    /// Add every container path reachable from `root` within `max_depth`.
    pub fn expand_all<S: HierarchySource>(&mut self, source: &S, root: &Path, max_depth: usize) {
        self.expand_all_inner(source, root, 0, max_depth);
    }

    fn expand_all_inner<S: HierarchySource>(
        &mut self,
        source: &S,
        path: &Path,
        depth: usize,
        max_depth: usize,
    ) {
        if depth >= max_depth {
            return;
        }
        let children = match source.children(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        self.expanded.insert(path.to_path_buf());
        for child in children.iter().filter(|c| c.is_container) {
            self.expand_all_inner(source, &child.path, depth + 1, max_depth);
        }
    }

    /// Clear the whole set.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Expand the ancestor chain of `target` so a reveal operation can make
    /// it visible, without touching sibling state.
    ///
    /// The walk is anchored at `root` (the effective root): only the
    /// container ancestors strictly between `root` and `target` are added.
    /// The target itself, the root, and anything above the root stay out of
    /// the set, so absolute-path hierarchies never pick up host directories.
    pub fn expand_to_path(&mut self, root: &Path, target: &Path) {
        for ancestor in target.ancestors().skip(1) {
            if ancestor == root || !ancestor.starts_with(root) {
                break;
            }
            self.expanded.insert(ancestor.to_path_buf());
        }
    }

    /// Number of expanded containers.
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Snapshot the set, ordered so ancestors come before descendants.
    ///
    /// The order makes a later `restore` re-expand parents before children,
    /// which matters for sources that load lazily.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        let mut ordered: Vec<PathBuf> = self.expanded.iter().cloned().collect();
        ordered.sort_by(|a, b| {
            a.components()
                .count()
                .cmp(&b.components().count())
                .then_with(|| a.cmp(b))
        });
        ordered
    }

    /// Replace the membership with a previously snapshotted path list.
    pub fn restore(&mut self, paths: &[PathBuf]) {
        self.expanded = paths.iter().cloned().collect();
    }
}
