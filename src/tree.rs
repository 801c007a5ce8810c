use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::counts::FolderCountCache;
use crate::expansion::ExpansionState;
use crate::search::{filter_tree, SearchQuery};
use crate::sort::{sort_siblings, SortCriterion};
use crate::source::{EntryInfo, HierarchySource};

/// Node discrimination, decided once at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    File,
}

/// One entry in the engine's own tree, rebuilt fresh on every pass.
///
/// Ownership runs root → children; the parent relation is derived from
/// `path.parent()` rather than stored, since nodes are discarded after the
/// flattener consumes them. Only path-keyed state (expansion set, focus,
/// counts) survives across passes.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Unique stable identity; the expansion-store and focus-history key.
    pub path: PathBuf,
    pub name: String,
    pub kind: NodeKind,
    /// Depth from the current effective root; the root's direct children are 0.
    pub level: usize,
    /// Whether the entry has at least one eligible child, independent of expansion.
    pub has_children: bool,
    pub is_expanded: bool,
    /// Populated only when expanded or a search is active.
    pub children: Vec<TreeNode>,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Recursive file count attached from the folder-count cache.
    pub file_count: Option<usize>,
    /// Set when children exist below the depth bound and were not traversed,
    /// so a caller can render a depth-limit placeholder.
    pub depth_limited: bool,
    /// False with non-empty children means this node survives a search only
    /// as an ancestor of a match.
    pub matches_search: bool,
    pub search_score: f32,
}

impl TreeNode {
    fn from_entry(entry: &EntryInfo, level: usize) -> Self {
        Self {
            path: entry.path.clone(),
            name: entry.name.clone(),
            kind: if entry.is_container {
                NodeKind::Folder
            } else {
                NodeKind::File
            },
            level,
            has_children: false,
            is_expanded: false,
            children: Vec::new(),
            size: entry.size,
            modified: entry.modified,
            file_count: None,
            depth_limited: false,
            matches_search: false,
            search_score: 0.0,
        }
    }

    /// Parent path for upward walks (associative, not an owning link).
    pub fn parent_path(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Deepest level present in this subtree.
    pub fn max_level(&self) -> usize {
        self.children
            .iter()
            .map(TreeNode::max_level)
            .max()
            .unwrap_or(self.level)
    }

    #[cfg(test)]
    pub(crate) fn leaf_for_test(
        name: &str,
        kind: NodeKind,
        size: u64,
        modified: Option<SystemTime>,
    ) -> Self {
        Self {
            path: PathBuf::from(name),
            name: name.to_string(),
            kind,
            level: 0,
            has_children: false,
            is_expanded: false,
            children: Vec::new(),
            size,
            modified,
            file_count: None,
            depth_limited: false,
            matches_search: false,
            search_score: 0.0,
        }
    }
}

/// Inputs for one build pass.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions<'a> {
    /// Include leaf entries, or folders only.
    pub include_files: bool,
    /// Maximum node level traversed; levels beyond it are flagged, not built.
    pub max_depth: usize,
    pub sort: SortCriterion,
    pub expansion: &'a ExpansionState,
    /// Active search, if any; forces descent and prunes the result.
    pub query: Option<&'a SearchQuery>,
    /// Path components excluded from the tree entirely.
    pub excluded_names: &'a [String],
    /// Count cache to attach folder totals from (never recomputed per build).
    pub counts: Option<&'a FolderCountCache>,
}

impl<'a> BuildOptions<'a> {
    pub fn new(expansion: &'a ExpansionState) -> Self {
        Self {
            include_files: true,
            max_depth: 50,
            sort: SortCriterion::Name,
            expansion,
            query: None,
            excluded_names: &[],
            counts: None,
        }
    }
}

/// Build the in-memory tree for one pass, rooted at `root`.
///
/// Recursive descent; children are constructed only for expanded containers
/// (or everywhere while a search is active), which bounds work on deep/wide
/// hierarchies. Containers whose listing fails are treated as empty rather
/// than failing the pass, so the result is always a complete, consistent
/// tree. The returned root node itself is a wrapper and is not a visible row.
pub fn build<S: HierarchySource>(source: &S, root: &Path, opts: &BuildOptions) -> TreeNode {
    let root_entry = source.entry(root).unwrap_or_else(|| EntryInfo {
        name: EntryInfo::name_of(root),
        path: root.to_path_buf(),
        is_container: true,
        size: 0,
        modified: None,
    });

    let mut node = TreeNode::from_entry(&root_entry, 0);
    node.is_expanded = true;
    if let Some(counts) = opts.counts {
        node.file_count = counts.get(root).map(|c| c.recursive_file_count);
    }

    let eligible = eligible_children(source, root, opts);
    node.has_children = !eligible.is_empty();
    let mut children: Vec<TreeNode> = eligible
        .iter()
        .map(|e| build_node(source, e, 0, opts))
        .collect();
    sort_siblings(&mut children, opts.sort);
    node.children = children;

    if let Some(query) = opts.query {
        filter_tree(&mut node, query);
        debug!(root = %root.display(), query = query.raw(), "build pass with search filter");
    } else {
        debug!(root = %root.display(), "build pass");
    }
    node
}

fn build_node<S: HierarchySource>(
    source: &S,
    entry: &EntryInfo,
    level: usize,
    opts: &BuildOptions,
) -> TreeNode {
    let mut node = TreeNode::from_entry(entry, level);
    if node.kind == NodeKind::File {
        return node;
    }

    node.is_expanded = opts.expansion.is_expanded(&node.path);
    if let Some(counts) = opts.counts {
        node.file_count = counts.get(&node.path).map(|c| c.recursive_file_count);
    }

    let eligible = eligible_children(source, &node.path, opts);
    node.has_children = !eligible.is_empty();

    // Lazy expansion: collapsed, non-searched branches are never built.
    let descend = node.is_expanded || opts.query.is_some();
    if !descend || eligible.is_empty() {
        return node;
    }

    if level + 1 > opts.max_depth {
        if eligible.iter().any(|e| e.is_container) {
            node.depth_limited = true;
        }
        return node;
    }

    let mut children: Vec<TreeNode> = eligible
        .iter()
        .map(|e| build_node(source, e, level + 1, opts))
        .collect();
    sort_siblings(&mut children, opts.sort);
    node.children = children;
    node
}

/// Children of `path` that survive the include-files and exclusion filters.
/// An unreadable container yields an empty list.
fn eligible_children<S: HierarchySource>(
    source: &S,
    path: &Path,
    opts: &BuildOptions,
) -> Vec<EntryInfo> {
    let listing = source.children(path).unwrap_or_default();
    listing
        .into_iter()
        .filter(|e| e.is_container || opts.include_files)
        .filter(|e| !opts.excluded_names.iter().any(|x| x == &e.name))
        .collect()
}
