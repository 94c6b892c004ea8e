//! Attached item model.
//!
//! # Responsibility
//! - Define flat, per-node ordered leaf items.
//! - Define the closed set of payload variants used by collaborators.
//!
//! # Invariants
//! - `index` is positive and unique inside the owning node only.
//! - The store never inspects the payload; it is serialized as-is.

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable attached item identifier.
pub type ItemId = Uuid;

/// Ordering key of an item inside its node. Not necessarily contiguous.
pub type ItemIndex = i64;

/// Leaf item owned by exactly one outline node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedItem<P> {
    pub item_id: ItemId,
    pub node_id: NodeId,
    pub index: ItemIndex,
    pub is_hidden: bool,
    pub payload: P,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Payload variants carried by items of the built-in tree kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemPayload {
    /// Link to another resource of the platform (program trees).
    Resource { title: String, target: String },
    /// Bibliographic reference.
    Bibliography {
        authors: String,
        title: String,
        source: String,
        publisher: String,
        date: String,
        identifier: String,
        url: Option<String>,
    },
    /// Question and answer pair (FAQ trees).
    QuestionAnswer { question: String, answer: String },
    /// External hyperlink.
    Link {
        title: String,
        description: String,
        url: String,
    },
}
