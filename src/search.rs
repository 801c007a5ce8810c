use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::Regex;
use tracing::debug;

use crate::tree::TreeNode;

/// How the query string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternMode {
    /// Literal text with tiered exact/prefix/substring/subsequence scoring.
    #[default]
    Plain,
    /// Regular expression (malformed patterns degrade to Plain).
    Regex,
    /// Glob pattern, translated to an anchored regex (`*`, `?`).
    Glob,
}

/// Search behaviour knobs.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub mode: PatternMode,
}

/// A parsed, ready-to-score query.
///
/// Construction never fails: pattern-mode compile errors are recovered by
/// falling back to literal substring matching.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    raw: String,
    folded: String,
    regex: Option<Regex>,
    case_sensitive: bool,
}

impl SearchQuery {
    /// Parse a query. Returns `None` for empty or pure-whitespace input so
    /// callers can skip the filtering pass entirely when idle.
    pub fn parse(query: &str, options: &SearchOptions) -> Option<Self> {
        let raw = query.trim();
        if raw.is_empty() {
            return None;
        }

        let pattern = match options.mode {
            PatternMode::Plain => None,
            PatternMode::Regex => Some(raw.to_string()),
            PatternMode::Glob => Some(glob_to_regex(raw)),
        };

        let regex = pattern.and_then(|p| {
            let p = if options.case_sensitive {
                p
            } else {
                format!("(?i){}", p)
            };
            match Regex::new(&p) {
                Ok(re) => Some(re),
                Err(e) => {
                    debug!(pattern = %p, error = %e, "pattern failed to compile, using literal match");
                    None
                }
            }
        });

        let folded = if options.case_sensitive {
            raw.to_string()
        } else {
            raw.to_lowercase()
        };

        Some(Self {
            raw: raw.to_string(),
            folded,
            regex,
            case_sensitive: options.case_sensitive,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Score a name against this query, in `[0, 1]`.
    ///
    /// Tiers: exact 1.0, prefix 0.8, substring 0.5, otherwise subsequence
    /// `(matched / query_len) * 0.3`. Zero means non-matching. The constants
    /// are behaviour-compatibility values and must not be retuned.
    pub fn score(&self, name: &str) -> f32 {
        if let Some(re) = &self.regex {
            return match re.find(name) {
                Some(m) if m.start() == 0 && m.end() == name.len() => 1.0,
                Some(_) => 0.5,
                None => 0.0,
            };
        }

        let folded_name = if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        };

        if folded_name == self.folded {
            return 1.0;
        }
        if folded_name.starts_with(&self.folded) {
            return 0.8;
        }
        if folded_name.contains(&self.folded) {
            return 0.5;
        }
        subsequence_ratio(&folded_name, &self.folded) * 0.3
    }
}

/// Fraction of query characters found in order within `name`.
fn subsequence_ratio(name: &str, query: &str) -> f32 {
    let query_len = query.chars().count();
    if query_len == 0 {
        return 0.0;
    }
    let mut matched = 0usize;
    let mut name_chars = name.chars();
    'outer: for qc in query.chars() {
        for nc in name_chars.by_ref() {
            if nc == qc {
                matched += 1;
                continue 'outer;
            }
        }
        break;
    }
    matched as f32 / query_len as f32
}

/// Translate a glob pattern into an anchored regex source.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

/// Convenience scorer with default options (case-insensitive plain mode).
pub fn score(name: &str, query: &str) -> f32 {
    match SearchQuery::parse(query, &SearchOptions::default()) {
        Some(q) => q.score(name),
        None => 0.0,
    }
}

/// Prune a built tree in place so only matches and their ancestor chains
/// survive.
///
/// Matching nodes are annotated with their score; ancestors of matches are
/// kept and force-expanded so results are visible without manual expansion.
/// Returns whether any descendant of `node` matches, which is exactly when
/// `node` itself must stay open.
pub fn filter_tree(node: &mut TreeNode, query: &SearchQuery) -> bool {
    let mut kept = Vec::new();
    for mut child in node.children.drain(..) {
        let child_score = query.score(&child.name);
        child.search_score = child_score;
        child.matches_search = child_score > 0.0;

        if filter_tree(&mut child, query) {
            // Force-expand so the nested match is visible for the search's
            // duration. A match with no matching descendants stays closed;
            // leaves in particular must not read as expanded.
            child.is_expanded = true;
            kept.push(child);
        } else if child.matches_search {
            kept.push(child);
        }
    }
    node.children = kept;
    !node.children.is_empty()
}

/// Matched character indices of `query` within `name`, for highlight
/// rendering in the flat list.
pub fn match_positions(name: &str, query: &str) -> Vec<usize> {
    let matcher = SkimMatcherV2::default();
    matcher
        .fuzzy_indices(name, query)
        .map(|(_, indices)| indices)
        .unwrap_or_default()
}
