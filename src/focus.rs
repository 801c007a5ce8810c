use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::source::HierarchySource;

/// Maximum retained history entries; pushing past the bound evicts the oldest.
pub const HISTORY_BOUND: usize = 50;

/// One breadcrumb segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub path: PathBuf,
}

/// A saved navigation state for back/forward moves.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub focused: Option<PathBuf>,
    /// Expansion snapshot taken when leaving this state.
    pub expanded: Vec<PathBuf>,
    pub timestamp: SystemTime,
}

/// Focus/root-shift navigator.
///
/// `focused = None` means the effective root is the hierarchy source's true
/// root. Keys exclusively on paths; it holds no tree nodes, so rebuilds never
/// invalidate it.
#[derive(Debug, Default)]
pub struct FocusNavigator {
    focused: Option<PathBuf>,
    breadcrumb: Vec<Crumb>,
    back: Vec<HistoryEntry>,
    forward: Vec<HistoryEntry>,
}

impl FocusNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&Path> {
        self.focused.as_deref()
    }

    /// Breadcrumb trail root → focused container; empty when unfocused.
    pub fn breadcrumb(&self) -> &[Crumb] {
        &self.breadcrumb
    }

    /// The effective root for tree building.
    pub fn effective_root<S: HierarchySource>(&self, source: &S) -> PathBuf {
        self.focused.clone().unwrap_or_else(|| source.root())
    }

    /// Shift the effective root to `path`.
    ///
    /// Fails with `InvalidFocusTarget` (state untouched) unless `path`
    /// resolves to a container. On success the previous state, with the
    /// caller's current expansion snapshot, is pushed onto the back stack and
    /// the forward stack is cleared.
    pub fn focus_on<S: HierarchySource>(
        &mut self,
        source: &S,
        path: &Path,
        expanded_snapshot: Vec<PathBuf>,
    ) -> Result<()> {
        match source.entry(path) {
            Some(e) if e.is_container => {}
            _ => return Err(EngineError::InvalidFocusTarget(path.to_path_buf())),
        }

        self.push_back(HistoryEntry {
            focused: self.focused.clone(),
            expanded: expanded_snapshot,
            timestamp: SystemTime::now(),
        });
        self.forward.clear();
        self.focused = Some(path.to_path_buf());
        self.breadcrumb = build_breadcrumb(source, path);
        debug!(target_path = %path.display(), "focus shifted");
        Ok(())
    }

    /// Return to the true root. History is preserved.
    pub fn unfocus(&mut self) {
        self.focused = None;
        self.breadcrumb.clear();
    }

    /// Pop the back stack, saving the current state for `go_forward`.
    /// Returns the restored expansion snapshot, or `None` at the stack bottom.
    pub fn go_back<S: HierarchySource>(
        &mut self,
        source: &S,
        expanded_snapshot: Vec<PathBuf>,
    ) -> Option<Vec<PathBuf>> {
        let entry = self.back.pop()?;
        self.forward.push(HistoryEntry {
            focused: self.focused.clone(),
            expanded: expanded_snapshot,
            timestamp: SystemTime::now(),
        });
        self.apply(source, entry)
    }

    /// Inverse of `go_back`.
    pub fn go_forward<S: HierarchySource>(
        &mut self,
        source: &S,
        expanded_snapshot: Vec<PathBuf>,
    ) -> Option<Vec<PathBuf>> {
        let entry = self.forward.pop()?;
        self.push_back(HistoryEntry {
            focused: self.focused.clone(),
            expanded: expanded_snapshot,
            timestamp: SystemTime::now(),
        });
        self.apply(source, entry)
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    fn apply<S: HierarchySource>(
        &mut self,
        source: &S,
        entry: HistoryEntry,
    ) -> Option<Vec<PathBuf>> {
        self.breadcrumb = match &entry.focused {
            Some(p) => build_breadcrumb(source, p),
            None => Vec::new(),
        };
        self.focused = entry.focused;
        Some(entry.expanded)
    }

    fn push_back(&mut self, entry: HistoryEntry) {
        if self.back.len() == HISTORY_BOUND {
            self.back.remove(0);
        }
        self.back.push(entry);
    }
}

/// Walk the ancestor chain of `path` from the source root down, resolving
/// each segment. The walk never climbs above the root, so absolute-path
/// hierarchies do not surface host directories in the trail. A segment that
/// fails to resolve truncates the trail early rather than failing the whole
/// operation.
fn build_breadcrumb<S: HierarchySource>(source: &S, path: &Path) -> Vec<Crumb> {
    let root = source.root();
    let mut chain: Vec<&Path> = path
        .ancestors()
        .take_while(|p| p.starts_with(&root))
        .collect();
    chain.reverse();

    let mut trail = Vec::with_capacity(chain.len());
    for segment in chain {
        match source.entry(segment) {
            Some(e) => trail.push(Crumb {
                name: e.name,
                path: e.path,
            }),
            None => break,
        }
    }
    trail
}
