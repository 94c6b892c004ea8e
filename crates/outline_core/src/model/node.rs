//! Outline node model.
//!
//! # Responsibility
//! - Define the persisted shape of one outline entry.
//! - Validate user-editable fields before any write.
//!
//! # Invariants
//! - `position` is positive and unique inside the node's scope.
//! - `level` is at least 1; parent/child relations are never stored, they are
//!   implied by `(position, level)` of consecutive entries.
//! - A time range never ends before it starts.

use crate::model::scope::{Scope, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable outline node identifier.
pub type NodeId = Uuid;

/// Ordering key of a node inside its scope. Not necessarily contiguous.
pub type Position = i64;

/// Depth of a node; top-level nodes have level 1.
pub type Level = u32;

/// Maximum number of characters in a node title.
pub const MAX_TITLE_CHARS: usize = 127;

/// Field validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is blank after trim.
    BlankTitle,
    /// Title exceeds `MAX_TITLE_CHARS`.
    TitleTooLong { chars: usize, max: usize },
    /// End of time range precedes its start.
    InvalidTimeRange { start_ms: i64, end_ms: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "node title must not be blank"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "node title has {chars} characters, at most {max} allowed")
            }
            Self::InvalidTimeRange { start_ms, end_ms } => write!(
                f,
                "time range end ({end_ms}) must not be earlier than start ({start_ms})"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Inclusive time window attached to a node, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }
}

/// User-editable node content. Has no effect on position or level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeFields {
    pub title: String,
    pub body: String,
    pub time_range: Option<TimeRange>,
}

impl NodeFields {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    /// Checks title and time range constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        let chars = title.chars().count();
        if chars > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong {
                chars,
                max: MAX_TITLE_CHARS,
            });
        }
        if let Some(range) = self.time_range {
            if range.end_ms < range.start_ms {
                return Err(ValidationError::InvalidTimeRange {
                    start_ms: range.start_ms,
                    end_ms: range.end_ms,
                });
            }
        }
        Ok(())
    }

    /// Validates and returns a copy with the title trimmed.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        self.validate()?;
        Ok(Self {
            title: self.title.trim().to_string(),
            body: self.body.clone(),
            time_range: self.time_range,
        })
    }
}

/// Outline node read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub node_id: NodeId,
    pub scope: Scope,
    pub position: Position,
    pub level: Level,
    pub title: String,
    pub body: String,
    pub is_hidden: bool,
    /// Identity of the user that created the node.
    pub author_id: UserId,
    pub time_range: Option<TimeRange>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl OutlineNode {
    pub fn is_visible(&self) -> bool {
        !self.is_hidden
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeFields, TimeRange, ValidationError, MAX_TITLE_CHARS};

    #[test]
    fn normalized_trims_title() {
        let fields = NodeFields::new("  Intro  ").normalized().unwrap();
        assert_eq!(fields.title, "Intro");
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(
            NodeFields::new(" \t").validate(),
            Err(ValidationError::BlankTitle)
        );
    }

    #[test]
    fn overlong_title_is_rejected() {
        let title = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(matches!(
            NodeFields::new(title).validate(),
            Err(ValidationError::TitleTooLong { .. })
        ));
        assert!(NodeFields::new("x".repeat(MAX_TITLE_CHARS)).validate().is_ok());
    }

    #[test]
    fn reversed_time_range_is_rejected() {
        let fields = NodeFields::new("Exam").with_time_range(TimeRange::new(10, 5));
        assert_eq!(
            fields.validate(),
            Err(ValidationError::InvalidTimeRange {
                start_ms: 10,
                end_ms: 5
            })
        );
    }
}
