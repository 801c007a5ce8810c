use std::path::Path;

use crate::flatten::{index_of, FlatRow};

/// A requested selection move over the flattened list.
///
/// Expand/collapse are not moves; they go through the expansion store and
/// trigger a re-flatten instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
    First,
    Last,
    PageForward(usize),
    PageBackward(usize),
}

/// Resolve a move to a target index in `rows`.
///
/// Pure: never mutates state. Page moves clamp to list bounds. With no
/// current selection, any move lands on the nearest list edge. Returns `None`
/// only for an empty list.
pub fn resolve(rows: &[FlatRow], current: Option<&Path>, direction: Direction) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    let last = rows.len() - 1;
    let current_index = current.and_then(|p| index_of(rows, p));

    let target = match direction {
        Direction::First => 0,
        Direction::Last => last,
        Direction::Next => match current_index {
            Some(i) => (i + 1).min(last),
            None => 0,
        },
        Direction::Prev => match current_index {
            Some(i) => i.saturating_sub(1),
            None => 0,
        },
        Direction::PageForward(n) => match current_index {
            Some(i) => (i + n).min(last),
            None => n.min(last),
        },
        Direction::PageBackward(n) => match current_index {
            Some(i) => i.saturating_sub(n),
            None => 0,
        },
    };
    Some(target)
}
