//! Subtree ranges, sibling lookup and movement preconditions.
//!
//! All functions taking an `index` require it to be in bounds of `entries`.

use super::{Movement, OutlineEntry};
use crate::model::node::{Level, NodeId, OutlineNode, Position};

/// Inclusive range of slice indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub begin: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn len(&self) -> usize {
        self.end - self.begin + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.begin..=self.end).contains(&index)
    }
}

/// Inclusive range of stored positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    pub begin: Position,
    pub end: Position,
}

impl PositionRange {
    pub fn new(begin: Position, end: Position) -> Self {
        Self { begin, end }
    }

    /// Positions spanned by `range` in `entries`.
    pub fn of<T: OutlineEntry>(entries: &[T], range: IndexRange) -> Self {
        Self {
            begin: entries[range.begin].position(),
            end: entries[range.end].position(),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        (self.begin..=self.end).contains(&position)
    }
}

/// Finds the slice index of `node_id`.
pub fn locate(nodes: &[OutlineNode], node_id: NodeId) -> Option<usize> {
    nodes.iter().position(|node| node.node_id == node_id)
}

/// Index of the last entry of the subtree rooted at `index`, or `index`
/// itself when it has no descendants.
pub fn last_descendant<T: OutlineEntry>(entries: &[T], index: usize) -> usize {
    let level = entries[index].level();
    entries[index + 1..]
        .iter()
        .position(|entry| entry.level() <= level)
        .map_or(entries.len() - 1, |offset| index + offset)
}

/// The node at `index` plus all its descendants.
pub fn subtree_range<T: OutlineEntry>(entries: &[T], index: usize) -> IndexRange {
    IndexRange {
        begin: index,
        end: last_descendant(entries, index),
    }
}

/// Previous entry at the same level reachable without crossing a shallower one.
pub fn prev_sibling<T: OutlineEntry>(entries: &[T], index: usize) -> Option<usize> {
    let level = entries[index].level();
    for i in (0..index).rev() {
        let current = entries[i].level();
        if current == level {
            return Some(i);
        }
        if current < level {
            return None;
        }
    }
    None
}

/// Next entry at the same level reachable without crossing a shallower one.
pub fn next_sibling<T: OutlineEntry>(entries: &[T], index: usize) -> Option<usize> {
    let level = entries[index].level();
    for (i, entry) in entries.iter().enumerate().skip(index + 1) {
        let current = entry.level();
        if current == level {
            return Some(i);
        }
        if current < level {
            return None;
        }
    }
    None
}

/// Closest preceding entry one level up. `None` for top-level entries.
pub fn parent_of<T: OutlineEntry>(entries: &[T], index: usize) -> Option<usize> {
    let level = entries[index].level();
    (0..index).rev().find(|&i| entries[i].level() < level)
}

pub fn has_children<T: OutlineEntry>(entries: &[T], index: usize) -> bool {
    entries
        .get(index + 1)
        .is_some_and(|next| next.level() > entries[index].level())
}

/// Deepest level in the sequence, 0 when empty.
pub fn max_level<T: OutlineEntry>(entries: &[T]) -> Level {
    entries.iter().map(OutlineEntry::level).max().unwrap_or(0)
}

/// Whether `movement` is structurally allowed for the entry at `index`.
///
/// Indent only needs an existing preceding sibling: when that sibling already
/// has deeper descendants, the indented subtree simply becomes its last child.
pub fn can_move<T: OutlineEntry>(entries: &[T], index: usize, movement: Movement) -> bool {
    match movement {
        Movement::Up | Movement::Right => prev_sibling(entries, index).is_some(),
        Movement::Down => next_sibling(entries, index).is_some(),
        Movement::Left => entries[index].level() > 1,
    }
}
