use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::tree::{NodeKind, TreeNode};

/// One row of the flattened projection, the sole input to windowed rendering.
#[derive(Debug, Clone)]
pub struct FlatRow {
    pub path: PathBuf,
    pub name: String,
    pub kind: NodeKind,
    pub level: usize,
    pub is_expanded: bool,
    pub has_children: bool,
    pub depth_limited: bool,
    /// Present only for nodes that matched the active search.
    pub search_score: Option<f32>,
    /// Position in the flattened list; valid until the next flatten pass.
    pub virtual_index: usize,
}

/// Project the built tree into an ordered row list.
///
/// Depth-first pre-order; a node's children are visited iff it is expanded
/// (post-search-pruning state). The effective root itself is not emitted, so
/// its direct children sit at level 0. Linear in the number of visible nodes
/// since collapsed branches were never built.
pub fn flatten(root: &TreeNode) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    for child in &root.children {
        flatten_node(child, &mut rows);
    }
    rows
}

fn flatten_node(node: &TreeNode, rows: &mut Vec<FlatRow>) {
    rows.push(FlatRow {
        path: node.path.clone(),
        name: node.name.clone(),
        kind: node.kind,
        level: node.level,
        is_expanded: node.is_expanded,
        has_children: node.has_children,
        depth_limited: node.depth_limited,
        search_score: node.matches_search.then_some(node.search_score),
        virtual_index: rows.len(),
    });

    if node.is_expanded {
        for child in &node.children {
            flatten_node(child, rows);
        }
    }
}

/// Find a row index by path.
pub fn index_of(rows: &[FlatRow], path: &Path) -> Option<usize> {
    rows.iter().position(|r| r.path == path)
}

/// The visible window over the flattened list.
///
/// Renderers materialize only `range(..)` rows; `scroll_to` recenters only
/// when the target index is outside the window, never when already visible.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    /// Index of the first visible row.
    pub start: usize,
    /// Number of rows shown at once.
    pub height: usize,
    /// Extra rows rendered above and below the window.
    pub overscan: usize,
}

impl Viewport {
    pub fn new(height: usize, overscan: usize) -> Self {
        Self {
            start: 0,
            height,
            overscan,
        }
    }

    /// Whether `index` is inside the visible window (overscan excluded).
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.height
    }

    /// Contiguous index range to materialize, overscan included, clamped to `len`.
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = self.start.saturating_sub(self.overscan);
        let end = (self.start + self.height + self.overscan).min(len);
        start..end.max(start)
    }

    /// Bring `index` into view, center-aligned, but only when it is currently
    /// outside the window.
    pub fn scroll_to(&mut self, index: usize, len: usize) {
        if self.contains(index) || self.height == 0 {
            return;
        }
        let centered = index.saturating_sub(self.height / 2);
        self.start = centered.min(len.saturating_sub(self.height));
    }

    /// Clamp the window after the list shrank.
    pub fn clamp(&mut self, len: usize) {
        self.start = self.start.min(len.saturating_sub(self.height));
    }
}
