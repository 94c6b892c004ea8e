//! Reconstruction of the implied tree and structural validation.
//!
//! # Invariants
//! - Positions are positive and strictly increasing.
//! - The first entry has level 1; every other entry is at most one level
//!   deeper than its predecessor.

use super::OutlineEntry;
use crate::model::node::{Level, Position};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Violation of the outline sequence invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Position is zero or negative.
    NonPositivePosition { index: usize, position: Position },
    /// Position does not strictly increase (duplicate or out of order).
    UnorderedPosition {
        index: usize,
        previous: Position,
        position: Position,
    },
    /// Level 0 is reserved for the implicit root.
    ZeroLevel { index: usize },
    /// Entry is more than one level deeper than its predecessor (or the
    /// first entry is not top-level).
    LevelJump {
        index: usize,
        previous: Level,
        level: Level,
    },
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositivePosition { index, position } => {
                write!(f, "entry {index} has non-positive position {position}")
            }
            Self::UnorderedPosition {
                index,
                previous,
                position,
            } => write!(
                f,
                "entry {index} has position {position} not greater than previous {previous}"
            ),
            Self::ZeroLevel { index } => write!(f, "entry {index} has level 0"),
            Self::LevelJump {
                index,
                previous,
                level,
            } => write!(
                f,
                "entry {index} jumps from level {previous} to level {level}"
            ),
        }
    }
}

impl Error for ShapeError {}

/// Checks that scanning `entries` yields a valid tree with unique positions.
pub fn check_invariants<T: OutlineEntry>(entries: &[T]) -> Result<(), ShapeError> {
    let mut previous: Option<(Position, Level)> = None;
    for (index, entry) in entries.iter().enumerate() {
        let position = entry.position();
        let level = entry.level();
        if position <= 0 {
            return Err(ShapeError::NonPositivePosition { index, position });
        }
        if level == 0 {
            return Err(ShapeError::ZeroLevel { index });
        }
        let (previous_position, previous_level) = previous.unwrap_or((0, 0));
        if index > 0 && position <= previous_position {
            return Err(ShapeError::UnorderedPosition {
                index,
                previous: previous_position,
                position,
            });
        }
        if level > previous_level + 1 {
            return Err(ShapeError::LevelJump {
                index,
                previous: previous_level,
                level,
            });
        }
        previous = Some((position, level));
    }
    Ok(())
}

/// Owned node of a reconstructed outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<T> {
    pub entry: T,
    pub children: Vec<TreeNode<T>>,
}

/// Nested view of a flat outline sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineTree<T> {
    pub roots: Vec<TreeNode<T>>,
}

impl<T: OutlineEntry> OutlineTree<T> {
    /// Rebuilds the nesting implied by consecutive levels.
    pub fn from_entries(entries: Vec<T>) -> Result<Self, ShapeError> {
        check_invariants(&entries)?;

        // Open path from a root down to the most recent entry.
        let mut stack: Vec<TreeNode<T>> = Vec::new();
        let mut roots = Vec::new();
        for entry in entries {
            let depth = entry.level() as usize;
            while stack.len() >= depth {
                close_top(&mut stack, &mut roots);
            }
            stack.push(TreeNode {
                entry,
                children: Vec::new(),
            });
        }
        while !stack.is_empty() {
            close_top(&mut stack, &mut roots);
        }
        Ok(Self { roots })
    }

    /// Depth-first `(position, level)` pairs, with levels re-derived from
    /// nesting depth.
    pub fn flatten(&self) -> Vec<(Position, Level)> {
        let mut out = Vec::new();
        for root in &self.roots {
            flatten_into(root, 1, &mut out);
        }
        out
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        fn count<T>(node: &TreeNode<T>) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn close_top<T>(stack: &mut Vec<TreeNode<T>>, roots: &mut Vec<TreeNode<T>>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

fn flatten_into<T: OutlineEntry>(
    node: &TreeNode<T>,
    level: Level,
    out: &mut Vec<(Position, Level)>,
) {
    out.push((node.entry.position(), level));
    for child in &node.children {
        flatten_into(child, level + 1, out);
    }
}
