//! Scope model: the namespace in which outline positions are unique.
//!
//! # Invariants
//! - A scope is the pair `(owner_id, kind)`; positions are only unique inside
//!   one scope.
//! - `TreeKind` is a closed set and its persisted names never change.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque identifier of the container that owns outlines (e.g. a course).
pub type OwnerId = i64;

/// Identity value supplied by the caller's authentication layer.
pub type UserId = i64;

/// Kind of outline kept for one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeKind {
    /// General course information.
    Information,
    /// Course program.
    Program,
    /// Teaching guide.
    TeachingGuide,
    /// Syllabus of lectures.
    LectureSyllabus,
    /// Syllabus of practicals.
    PracticalsSyllabus,
    /// Bibliography.
    Bibliography,
    /// Frequently asked questions.
    Faq,
    /// Link list.
    Links,
    /// Assessment description.
    Assessment,
}

impl TreeKind {
    pub const ALL: [TreeKind; 9] = [
        TreeKind::Information,
        TreeKind::Program,
        TreeKind::TeachingGuide,
        TreeKind::LectureSyllabus,
        TreeKind::PracticalsSyllabus,
        TreeKind::Bibliography,
        TreeKind::Faq,
        TreeKind::Links,
        TreeKind::Assessment,
    ];

    /// Persisted name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Program => "program",
            Self::TeachingGuide => "teaching_guide",
            Self::LectureSyllabus => "lecture_syllabus",
            Self::PracticalsSyllabus => "practicals_syllabus",
            Self::Bibliography => "bibliography",
            Self::Faq => "faq",
            Self::Links => "links",
            Self::Assessment => "assessment",
        }
    }

    /// Parses a persisted kind name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for TreeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outline namespace: an owner plus a tree kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub owner_id: OwnerId,
    pub kind: TreeKind,
}

impl Scope {
    pub fn new(owner_id: OwnerId, kind: TreeKind) -> Self {
        Self { owner_id, kind }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.kind)
    }
}
