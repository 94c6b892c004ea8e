//! Pure scans over a position-ordered outline sequence.
//!
//! # Responsibility
//! - Derive tree structure (subtrees, siblings, parents) from consecutive
//!   `(position, level)` pairs without any stored parent reference.
//! - Decide structural preconditions for move commands.
//!
//! # Invariants
//! - Input slices are sorted by ascending position.
//! - A node's subtree is the maximal run of following entries with a strictly
//!   greater level.
//! - Nothing here touches storage; repositories call these scans both before
//!   and after taking the write lock.

pub mod range;
pub mod shape;
pub mod view;

use crate::model::node::{Level, OutlineNode, Position};
use std::fmt::{Display, Formatter};

pub use range::{
    can_move, has_children, last_descendant, locate, max_level, next_sibling, parent_of,
    prev_sibling, subtree_range, IndexRange, PositionRange,
};
pub use shape::{check_invariants, OutlineTree, ShapeError, TreeNode};
pub use view::{number_outline, visible_outline, OutlineNumber, ViewMode, VisibleNode};

/// Anything that occupies one slot of an ordered outline.
pub trait OutlineEntry {
    fn position(&self) -> Position;
    fn level(&self) -> Level;
}

impl OutlineEntry for OutlineNode {
    fn position(&self) -> Position {
        self.position
    }

    fn level(&self) -> Level {
        self.level
    }
}

impl OutlineEntry for (Position, Level) {
    fn position(&self) -> Position {
        self.0
    }

    fn level(&self) -> Level {
        self.1
    }
}

/// Structural movement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    /// Swap with the preceding sibling subtree.
    Up,
    /// Swap with the following sibling subtree.
    Down,
    /// Outdent the subtree by one level.
    Left,
    /// Indent the subtree by one level.
    Right,
}

impl Movement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl Display for Movement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
