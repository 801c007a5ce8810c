use std::cmp::Ordering;
use std::time::UNIX_EPOCH;

use crate::tree::{NodeKind, TreeNode};

/// Sort criteria for sibling lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCriterion {
    /// Natural name order (case-insensitive, digit runs compare numerically).
    Name,
    /// By modification time (newest first).
    Modified,
    /// By file size (largest first); folders fall back to name order.
    Size,
}

impl SortCriterion {
    /// Parse a criterion from a config string. Unknown strings fall back to name.
    pub fn from_str(s: &str) -> Self {
        match s {
            "modified" => SortCriterion::Modified,
            "size" => SortCriterion::Size,
            _ => SortCriterion::Name,
        }
    }

    /// Display label for the current sort.
    pub fn label(&self) -> &'static str {
        match self {
            SortCriterion::Name => "Name",
            SortCriterion::Modified => "Modified",
            SortCriterion::Size => "Size",
        }
    }

    /// Cycle to the next criterion.
    pub fn next(&self) -> Self {
        match self {
            SortCriterion::Name => SortCriterion::Modified,
            SortCriterion::Modified => SortCriterion::Size,
            SortCriterion::Size => SortCriterion::Name,
        }
    }
}

impl Default for SortCriterion {
    fn default() -> Self {
        SortCriterion::Name
    }
}

/// Compare two sibling nodes under the given criterion.
///
/// Folders always precede files regardless of criterion. Never panics; every
/// pair of nodes is totally ordered.
pub fn compare(a: &TreeNode, b: &TreeNode, criterion: SortCriterion) -> Ordering {
    let folder_rank = matches!(b.kind, NodeKind::Folder).cmp(&matches!(a.kind, NodeKind::Folder));
    if folder_rank != Ordering::Equal {
        return folder_rank;
    }

    match criterion {
        SortCriterion::Name => natural_cmp(&a.name, &b.name),
        SortCriterion::Modified => {
            // Missing timestamps sort as epoch 0, i.e. last under descending order.
            let ta = a.modified.unwrap_or(UNIX_EPOCH);
            let tb = b.modified.unwrap_or(UNIX_EPOCH);
            tb.cmp(&ta).then_with(|| natural_cmp(&a.name, &b.name))
        }
        SortCriterion::Size => {
            if a.kind == NodeKind::Folder && b.kind == NodeKind::Folder {
                // Folders have no intrinsic size in this model.
                natural_cmp(&a.name, &b.name)
            } else {
                b.size.cmp(&a.size).then_with(|| natural_cmp(&a.name, &b.name))
            }
        }
    }
}

/// Sort a sibling list in place.
pub fn sort_siblings(children: &mut [TreeNode], criterion: SortCriterion) {
    children.sort_by(|a, b| compare(a, b, criterion));
}

/// Case-insensitive natural comparison: digit runs compare by numeric value,
/// so `file2` sorts before `file10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().flat_map(char::to_lowercase).peekable();
    let mut cb = b.chars().flat_map(char::to_lowercase).peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let na = take_number(&mut ca);
                    let nb = take_number(&mut cb);
                    match na.cmp(&nb) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    match x.cmp(&y) {
                        Ordering::Equal => {
                            ca.next();
                            cb.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

/// Consume a run of ASCII digits and return its numeric value.
/// Leading zeros compare equal to the bare number.
fn take_number<I: Iterator<Item = char>>(it: &mut std::iter::Peekable<I>) -> u128 {
    let mut n: u128 = 0;
    while let Some(&c) = it.peek() {
        if let Some(d) = c.to_digit(10) {
            n = n.saturating_mul(10).saturating_add(u128::from(d));
            it.next();
        } else {
            break;
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn folder(name: &str) -> TreeNode {
        TreeNode::leaf_for_test(name, NodeKind::Folder, 0, None)
    }

    fn file(name: &str, size: u64) -> TreeNode {
        TreeNode::leaf_for_test(name, NodeKind::File, size, None)
    }

    fn file_at(name: &str, secs: u64) -> TreeNode {
        TreeNode::leaf_for_test(
            name,
            NodeKind::File,
            0,
            Some(UNIX_EPOCH + Duration::from_secs(secs)),
        )
    }

    #[test]
    fn from_str_falls_back_to_name() {
        assert_eq!(SortCriterion::from_str("size"), SortCriterion::Size);
        assert_eq!(SortCriterion::from_str("modified"), SortCriterion::Modified);
        assert_eq!(SortCriterion::from_str("bogus"), SortCriterion::Name);
    }

    #[test]
    fn cycle_covers_all_criteria() {
        let c = SortCriterion::Name;
        assert_eq!(c.next(), SortCriterion::Modified);
        assert_eq!(c.next().next(), SortCriterion::Size);
        assert_eq!(c.next().next().next(), SortCriterion::Name);
    }

    #[test]
    fn folders_precede_files_under_every_criterion() {
        for criterion in [
            SortCriterion::Name,
            SortCriterion::Modified,
            SortCriterion::Size,
        ] {
            assert_eq!(
                compare(&folder("zzz"), &file("aaa", 999), criterion),
                Ordering::Less,
                "criterion {:?}",
                criterion
            );
        }
    }

    #[test]
    fn natural_order_sorts_item2_before_item10() {
        assert_eq!(natural_cmp("item2", "item10"), Ordering::Less);
        assert_eq!(natural_cmp("file10", "file2"), Ordering::Greater);
        assert_eq!(natural_cmp("a", "b"), Ordering::Less);
    }

    #[test]
    fn natural_order_is_case_insensitive() {
        assert_eq!(natural_cmp("Alpha", "alpha"), Ordering::Equal);
        assert_eq!(natural_cmp("Beta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn natural_order_leading_zeros() {
        assert_eq!(natural_cmp("file002", "file2"), Ordering::Equal);
        assert_eq!(natural_cmp("file02", "file10"), Ordering::Less);
    }

    #[test]
    fn modified_sorts_newest_first_missing_last() {
        let mut nodes = vec![file_at("old", 100), file_at("new", 5000), file("never", 0)];
        sort_siblings(&mut nodes, SortCriterion::Modified);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["new", "old", "never"]);
    }

    #[test]
    fn size_sorts_largest_first() {
        let mut nodes = vec![file("small", 5), file("big", 500), file("mid", 50)];
        sort_siblings(&mut nodes, SortCriterion::Size);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["big", "mid", "small"]);
    }

    #[test]
    fn size_between_folders_falls_back_to_name() {
        let mut nodes = vec![folder("zeta"), folder("alpha")];
        sort_siblings(&mut nodes, SortCriterion::Size);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn sort_is_deterministic_for_equal_keys() {
        let a = file("same.md", 10);
        let b = file("same.md", 10);
        assert_eq!(compare(&a, &b, SortCriterion::Name), Ordering::Equal);
    }
}
