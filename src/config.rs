//! Pane-scoped engine configuration.
//!
//! All fields are optional in the TOML representation so hosts can persist
//! partial overrides; accessors fall back to built-in defaults.

use serde::Deserialize;

use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::error::Result;
use crate::sort::SortCriterion;

/// Default depth bound for tree building.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Configuration for one pane instance.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PaneConfig {
    /// Include file leaves in the tree (false = folders only).
    pub include_files: Option<bool>,
    /// Maximum render depth.
    pub max_depth: Option<usize>,
    /// Sort order: "name", "modified", "size".
    pub sort_by: Option<String>,
    /// Path components excluded from the tree entirely.
    pub excluded_names: Option<Vec<String>>,
    /// Search-input debounce interval in milliseconds.
    pub search_debounce_ms: Option<u64>,
    /// Case-sensitive search matching.
    pub case_sensitive_search: Option<bool>,
}

impl PaneConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| crate::error::EngineError::Config(e.to_string()))
    }

    pub fn include_files(&self) -> bool {
        self.include_files.unwrap_or(true)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn sort_criterion(&self) -> SortCriterion {
        self.sort_by
            .as_deref()
            .map(SortCriterion::from_str)
            .unwrap_or_default()
    }

    pub fn excluded_names(&self) -> &[String] {
        self.excluded_names.as_deref().unwrap_or(&[])
    }

    pub fn search_debounce_ms(&self) -> u64 {
        self.search_debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    pub fn case_sensitive_search(&self) -> bool {
        self.case_sensitive_search.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = PaneConfig::default();
        assert!(cfg.include_files());
        assert_eq!(cfg.max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(cfg.sort_criterion(), SortCriterion::Name);
        assert!(cfg.excluded_names().is_empty());
        assert_eq!(cfg.search_debounce_ms(), DEFAULT_DEBOUNCE_MS);
        assert!(!cfg.case_sensitive_search());
    }

    #[test]
    fn partial_toml_overrides_merge_with_defaults() {
        let cfg = PaneConfig::from_toml_str(
            r#"
            include_files = false
            sort_by = "modified"
            excluded_names = [".git", "node_modules"]
            "#,
        )
        .unwrap();
        assert!(!cfg.include_files());
        assert_eq!(cfg.sort_criterion(), SortCriterion::Modified);
        assert_eq!(cfg.excluded_names(), [".git", "node_modules"]);
        // Unset fields keep defaults.
        assert_eq!(cfg.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn unknown_sort_string_falls_back_to_name() {
        let cfg = PaneConfig::from_toml_str(r#"sort_by = "color""#).unwrap();
        assert_eq!(cfg.sort_criterion(), SortCriterion::Name);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(PaneConfig::from_toml_str("include_files = maybe").is_err());
    }
}
