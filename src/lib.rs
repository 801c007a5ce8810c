//! Virtualized hierarchical tree engine for dual-pane file navigation.
//!
//! Turns a live folder/file hierarchy into an efficiently renderable,
//! searchable, sortable, navigable flat list, with an alternate focus root
//! and persistent expansion state across large hierarchies.
//!
//! The engine owns no rendering: consumers hold a [`pane::Pane`] handle,
//! drive it with events (expand toggles, query edits, focus changes,
//! mutation notices) and window over the flattened rows it produces.

pub mod config;
pub mod counts;
pub mod debounce;
pub mod error;
pub mod expansion;
pub mod flatten;
pub mod focus;
pub mod navigate;
pub mod pane;
pub mod search;
pub mod sort;
pub mod source;
pub mod tree;

pub use config::PaneConfig;
pub use error::{EngineError, Result};
pub use flatten::{FlatRow, Viewport};
pub use navigate::Direction;
pub use pane::Pane;
pub use search::{PatternMode, SearchOptions};
pub use sort::SortCriterion;
pub use source::{ChangeNotice, EntryInfo, FsSource, HierarchySource, MemorySource};
pub use tree::{NodeKind, TreeNode};
