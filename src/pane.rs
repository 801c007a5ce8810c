use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::PaneConfig;
use crate::counts::FolderCountCache;
use crate::debounce::{Debouncer, NoticeCoalescer, DEFAULT_FLOOD_THRESHOLD};
use crate::error::Result;
use crate::expansion::{ExpansionState, DEFAULT_EXPAND_ALL_DEPTH};
use crate::flatten::{flatten, index_of, FlatRow, Viewport};
use crate::focus::{Crumb, FocusNavigator};
use crate::navigate::{resolve, Direction};
use crate::search::{PatternMode, SearchOptions, SearchQuery};
use crate::sort::SortCriterion;
use crate::source::{ChangeNotice, HierarchySource};
use crate::tree::{build, BuildOptions};

/// One pane's engine instance: the explicit operations handle consumers hold
/// instead of any ambient global registry.
///
/// Owns all per-pane state (expansion set, focus, counts, query, rows) and
/// runs the rebuild → filter → flatten pipeline synchronously on each
/// triggering event. Exactly one pass is in flight at a time; a newer trigger
/// simply produces the next row list, discarding the previous one.
pub struct Pane<S: HierarchySource> {
    source: S,
    config: PaneConfig,
    expansion: ExpansionState,
    focus: FocusNavigator,
    counts: FolderCountCache,
    sort: SortCriterion,
    search_mode: PatternMode,
    /// Latest query edit, not yet applied while the debounce window is open.
    query_input: String,
    active_query: Option<SearchQuery>,
    rows: Vec<FlatRow>,
    selected: Option<PathBuf>,
    viewport: Viewport,
    search_debounce: Debouncer,
    notices: NoticeCoalescer,
}

impl<S: HierarchySource> Pane<S> {
    pub fn new(source: S, config: PaneConfig) -> Self {
        let root = source.root();
        let mut counts = FolderCountCache::new();
        counts.compute(&source, &root);

        let debounce = Duration::from_millis(config.search_debounce_ms());
        let sort = config.sort_criterion();
        let mut pane = Self {
            source,
            config,
            expansion: ExpansionState::new(),
            focus: FocusNavigator::new(),
            counts,
            sort,
            search_mode: PatternMode::Plain,
            query_input: String::new(),
            active_query: None,
            rows: Vec::new(),
            selected: None,
            viewport: Viewport::new(40, 5),
            search_debounce: Debouncer::new(debounce),
            notices: NoticeCoalescer::new(debounce, DEFAULT_FLOOD_THRESHOLD, root),
        };
        pane.rebuild();
        pane
    }

    // ── Outputs ──────────────────────────────────────────────────────────

    /// The flattened rows for the rendering layer to window over.
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    /// Breadcrumb trail when focus mode is active; empty otherwise.
    pub fn breadcrumb(&self) -> &[Crumb] {
        self.focus.breadcrumb()
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
            .as_deref()
            .and_then(|p| index_of(&self.rows, p))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn focused(&self) -> Option<&Path> {
        self.focus.focused()
    }

    pub fn sort_criterion(&self) -> SortCriterion {
        self.sort
    }

    pub fn counts(&self) -> &FolderCountCache {
        &self.counts
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    // ── Expansion operations ─────────────────────────────────────────────

    /// Toggle a container's expansion and re-project. No-op for leaves.
    pub fn toggle_expand(&mut self, path: &Path) {
        let is_container = self
            .source
            .entry(path)
            .map(|e| e.is_container)
            .unwrap_or(false);
        if !is_container {
            return;
        }
        self.expansion.toggle(path);
        self.rebuild();
    }

    pub fn expand_all(&mut self) {
        let root = self.focus.effective_root(&self.source);
        self.expansion
            .expand_all(&self.source, &root, DEFAULT_EXPAND_ALL_DEPTH);
        self.rebuild();
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
        self.rebuild();
    }

    /// Expand the ancestor chain of `path` and select it (reveal).
    pub fn reveal_path(&mut self, path: &Path) {
        let root = self.focus.effective_root(&self.source);
        self.expansion.expand_to_path(&root, path);
        self.rebuild();
        if let Some(i) = index_of(&self.rows, path) {
            self.selected = Some(path.to_path_buf());
            self.viewport.scroll_to(i, self.rows.len());
        }
    }

    // ── Sort and search ──────────────────────────────────────────────────

    pub fn set_sort_criterion(&mut self, criterion: SortCriterion) {
        if self.sort != criterion {
            self.sort = criterion;
            self.rebuild();
        }
    }

    pub fn set_pattern_mode(&mut self, mode: PatternMode) {
        self.search_mode = mode;
        if !self.query_input.is_empty() {
            self.apply_search_query(self.query_input.clone());
        }
    }

    /// Record a query edit; the rebuild fires via `tick` once typing goes
    /// quiescent for the configured debounce interval.
    pub fn set_search_query(&mut self, query: impl Into<String>, now: Instant) {
        self.query_input = query.into();
        self.search_debounce.schedule(now);
    }

    /// Apply a query immediately, bypassing the debounce window.
    pub fn apply_search_query(&mut self, query: impl Into<String>) {
        self.query_input = query.into();
        self.search_debounce.cancel();
        let options = SearchOptions {
            case_sensitive: self.config.case_sensitive_search(),
            mode: self.search_mode,
        };
        self.active_query = SearchQuery::parse(&self.query_input, &options);
        self.rebuild();
    }

    // ── Focus navigation ─────────────────────────────────────────────────

    /// Shift the effective root to `path`. On failure the pane state,
    /// including the current rows, is untouched.
    pub fn focus_on(&mut self, path: &Path) -> Result<()> {
        let snapshot = self.expansion.snapshot();
        self.focus.focus_on(&self.source, path, snapshot)?;
        self.rebuild();
        Ok(())
    }

    pub fn unfocus(&mut self) {
        self.focus.unfocus();
        self.rebuild();
    }

    /// Restore the previous focus and expansion snapshot. Returns whether a
    /// history entry was available.
    pub fn go_back(&mut self) -> bool {
        let snapshot = self.expansion.snapshot();
        match self.focus.go_back(&self.source, snapshot) {
            Some(restored) => {
                self.expansion.restore(&restored);
                self.rebuild();
                true
            }
            None => false,
        }
    }

    pub fn go_forward(&mut self) -> bool {
        let snapshot = self.expansion.snapshot();
        match self.focus.go_forward(&self.source, snapshot) {
            Some(restored) => {
                self.expansion.restore(&restored);
                self.rebuild();
                true
            }
            None => false,
        }
    }

    // ── Selection ────────────────────────────────────────────────────────

    /// Move the selection; scrolls into view only when the target left the
    /// visible window.
    pub fn navigate(&mut self, direction: Direction) -> Option<usize> {
        let target = resolve(&self.rows, self.selected.as_deref(), direction)?;
        self.selected = Some(self.rows[target].path.clone());
        self.viewport.scroll_to(target, self.rows.len());
        Some(target)
    }

    pub fn select_path(&mut self, path: &Path) {
        if let Some(i) = index_of(&self.rows, path) {
            self.selected = Some(path.to_path_buf());
            self.viewport.scroll_to(i, self.rows.len());
        }
    }

    // ── Mutation notices and the event-loop tick ─────────────────────────

    /// Buffer a hierarchy-mutation notice for coalesced handling.
    pub fn handle_notice(&mut self, notice: ChangeNotice, now: Instant) {
        self.notices.push(notice, now);
    }

    /// Apply a batch of notices at once: counts first, then one rebuild.
    pub fn handle_notices(&mut self, batch: Vec<ChangeNotice>) {
        if batch.is_empty() {
            return;
        }
        let root = self.source.root();
        for notice in &batch {
            self.counts.apply_notice(&self.source, notice, &root);
        }
        debug!(count = batch.len(), "applied mutation batch");
        self.rebuild();
    }

    /// Drive pending debounced work from the host's event loop.
    /// Returns true when the row list was re-projected.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if self.search_debounce.poll(now) {
            self.apply_search_query(self.query_input.clone());
            changed = true;
        }
        if let Some(batch) = self.notices.poll(now) {
            self.handle_notices(batch);
            changed = true;
        }
        changed
    }

    // ── Pipeline ─────────────────────────────────────────────────────────

    /// One all-or-nothing pass: build the tree for the effective root, prune
    /// by search, project to rows. Nodes from the previous pass are dropped
    /// wholesale, so a superseded pass can never leak into the output.
    fn rebuild(&mut self) {
        let root = self.focus.effective_root(&self.source);
        let excluded = self.config.excluded_names();
        let opts = BuildOptions {
            include_files: self.config.include_files(),
            max_depth: self.config.max_depth(),
            sort: self.sort,
            expansion: &self.expansion,
            query: self.active_query.as_ref(),
            excluded_names: excluded,
            counts: Some(&self.counts),
        };
        let tree = build(&self.source, &root, &opts);
        self.rows = flatten(&tree);
        self.viewport.clamp(self.rows.len());
        if let Some(selected) = &self.selected {
            if index_of(&self.rows, selected).is_none() {
                self.selected = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn fixture() -> MemorySource {
        let mut src = MemorySource::new("root");
        src.add_folder("root/A")
            .add_folder("root/A/sub")
            .add_folder("root/B")
            .add_file("root/A/x.md", 10, None)
            .add_file("root/A/y.md", 20, None)
            .add_file("root/B/z.md", 30, None);
        src
    }

    fn pane() -> Pane<MemorySource> {
        Pane::new(fixture(), PaneConfig::default())
    }

    fn names(pane: &Pane<MemorySource>) -> Vec<&str> {
        pane.rows().iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn initial_rows_are_collapsed_top_level() {
        let p = pane();
        assert_eq!(names(&p), vec!["A", "B"]);
    }

    #[test]
    fn toggle_expand_reprojects() {
        let mut p = pane();
        p.toggle_expand(Path::new("root/A"));
        assert_eq!(names(&p), vec!["A", "sub", "x.md", "y.md", "B"]);
        p.toggle_expand(Path::new("root/A"));
        assert_eq!(names(&p), vec!["A", "B"]);
    }

    #[test]
    fn toggle_expand_on_file_is_noop() {
        let mut p = pane();
        p.toggle_expand(Path::new("root/A/x.md"));
        assert_eq!(names(&p), vec!["A", "B"]);
        assert!(!p.expansion().is_expanded(Path::new("root/A/x.md")));
    }

    #[test]
    fn expand_all_and_collapse_all() {
        let mut p = pane();
        p.expand_all();
        assert_eq!(names(&p), vec!["A", "sub", "x.md", "y.md", "B", "z.md"]);
        p.collapse_all();
        assert_eq!(names(&p), vec!["A", "B"]);
    }

    #[test]
    fn reveal_path_expands_ancestors_and_selects() {
        let mut p = pane();
        p.reveal_path(Path::new("root/A/y.md"));
        assert!(p.expansion().is_expanded(Path::new("root/A")));
        assert_eq!(p.selected(), Some(Path::new("root/A/y.md")));
        assert!(p.selected_index().is_some());
        // Sibling B stays collapsed.
        assert!(!p.expansion().is_expanded(Path::new("root/B")));
    }

    #[test]
    fn reveal_path_over_absolute_source_keeps_host_directories_out() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("vault/A")).unwrap();
        std::fs::File::create(tmp.path().join("vault/A/x.md")).unwrap();
        let src = crate::source::FsSource::new(tmp.path().join("vault")).unwrap();

        let mut p = Pane::new(src, PaneConfig::default());
        p.reveal_path(&tmp.path().join("vault/A/x.md"));

        assert!(p.expansion().is_expanded(&tmp.path().join("vault/A")));
        assert_eq!(p.selected(), Some(tmp.path().join("vault/A/x.md").as_path()));
        // Nothing above the vault root enters the expansion set, so snapshots
        // and persisted state stay scoped to the hierarchy.
        for snapshot_path in p.expansion().snapshot() {
            assert!(snapshot_path.starts_with(tmp.path().join("vault")));
        }
    }

    #[test]
    fn sort_criterion_reorders_rows() {
        let mut p = pane();
        p.toggle_expand(Path::new("root/A"));
        p.set_sort_criterion(SortCriterion::Size);
        // Folders first, then files by descending size.
        assert_eq!(names(&p), vec!["A", "sub", "y.md", "x.md", "B"]);
    }

    #[test]
    fn debounced_search_applies_after_quiescence() {
        let mut p = pane();
        let t0 = Instant::now();
        p.set_search_query("z.md", t0);
        // Not yet applied.
        assert_eq!(names(&p), vec!["A", "B"]);
        assert!(!p.tick(t0 + Duration::from_millis(100)));
        assert!(p.tick(t0 + Duration::from_millis(400)));
        // B survives as force-expanded ancestor of the match.
        assert_eq!(names(&p), vec!["B", "z.md"]);
        let b = &p.rows()[0];
        assert!(b.is_expanded);
        assert!(b.search_score.is_none());
        assert_eq!(p.rows()[1].search_score, Some(1.0));
    }

    #[test]
    fn clearing_query_restores_unfiltered_rows() {
        let mut p = pane();
        p.apply_search_query("z.md");
        assert_eq!(names(&p), vec!["B", "z.md"]);
        p.apply_search_query("");
        assert_eq!(names(&p), vec!["A", "B"]);
    }

    #[test]
    fn search_does_not_persist_forced_expansion() {
        let mut p = pane();
        p.apply_search_query("z.md");
        p.apply_search_query("");
        // B was only force-expanded for the search's duration.
        assert!(!p.expansion().is_expanded(Path::new("root/B")));
    }

    #[test]
    fn focus_rebases_rows_and_breadcrumb() {
        let mut p = pane();
        p.focus_on(Path::new("root/A")).unwrap();
        assert_eq!(names(&p), vec!["sub", "x.md", "y.md"]);
        let crumb_names: Vec<&str> = p.breadcrumb().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(crumb_names, vec!["root", "A"]);
    }

    #[test]
    fn focus_on_file_fails_and_keeps_rows() {
        let mut p = pane();
        let before = names(&p).join(",");
        assert!(p.focus_on(Path::new("root/A/x.md")).is_err());
        assert_eq!(names(&p).join(","), before);
        assert!(p.breadcrumb().is_empty());
    }

    #[test]
    fn scenario_d_focus_then_back_restores_expansion() {
        let mut p = pane();
        p.toggle_expand(Path::new("root/A"));
        let expanded_before = p.expansion().snapshot();

        p.focus_on(Path::new("root/B")).unwrap();
        p.collapse_all();
        assert!(p.go_back());
        assert_eq!(p.focused(), None);
        assert_eq!(p.expansion().snapshot(), expanded_before);
        assert_eq!(names(&p), vec!["A", "sub", "x.md", "y.md", "B"]);
    }

    #[test]
    fn go_forward_after_back() {
        let mut p = pane();
        p.focus_on(Path::new("root/A")).unwrap();
        assert!(p.go_back());
        assert!(p.go_forward());
        assert_eq!(p.focused(), Some(Path::new("root/A")));
        assert!(!p.go_forward());
    }

    #[test]
    fn navigate_moves_selection_with_clamping() {
        let mut p = pane();
        assert_eq!(p.navigate(Direction::First), Some(0));
        assert_eq!(p.selected(), Some(Path::new("root/A")));
        assert_eq!(p.navigate(Direction::Next), Some(1));
        assert_eq!(p.navigate(Direction::Next), Some(1));
        assert_eq!(p.navigate(Direction::PageBackward(10)), Some(0));
    }

    #[test]
    fn coalesced_notices_trigger_one_rebuild_with_fresh_counts() {
        let mut p = pane();
        let t0 = Instant::now();
        // Mutate the source out-of-band, then deliver notices.
        p.source.add_file("root/B/new1.md", 1, None);
        p.source.add_file("root/B/new2.md", 1, None);
        p.handle_notice(ChangeNotice::Created(PathBuf::from("root/B/new1.md")), t0);
        p.handle_notice(
            ChangeNotice::Created(PathBuf::from("root/B/new2.md")),
            t0 + Duration::from_millis(10),
        );

        assert!(!p.tick(t0 + Duration::from_millis(50)));
        assert!(p.tick(t0 + Duration::from_millis(500)));
        let b = p.counts().get(Path::new("root/B")).unwrap();
        assert_eq!(b.file_count, 3);
        let root = p.counts().get(Path::new("root")).unwrap();
        assert_eq!(root.recursive_file_count, 5);
    }

    #[test]
    fn selection_drops_when_row_disappears() {
        let mut p = pane();
        p.toggle_expand(Path::new("root/A"));
        p.select_path(Path::new("root/A/x.md"));
        assert!(p.selected().is_some());
        p.toggle_expand(Path::new("root/A"));
        assert_eq!(p.selected(), None);
    }

    #[test]
    fn folder_counts_are_attached_to_rows_via_cache() {
        let p = pane();
        let a = p.counts().get(Path::new("root/A")).unwrap();
        assert_eq!(a.recursive_file_count, 2);
        assert!(a.is_complete);
    }
}
