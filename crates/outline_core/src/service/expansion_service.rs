//! Per-user expansion state service.

use crate::model::node::NodeId;
use crate::model::scope::UserId;
use crate::repo::error::OutlineResult;
use crate::repo::expansion_repo::ExpansionRepository;

/// Expansion state facade.
pub struct ExpansionService<E: ExpansionRepository> {
    repo: E,
}

impl<E: ExpansionRepository> ExpansionService<E> {
    pub fn new(repo: E) -> Self {
        Self { repo }
    }

    /// Idempotently marks `node_id` expanded for `user_id`.
    pub fn expand(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<()> {
        self.repo.expand(user_id, node_id)
    }

    /// Idempotently marks `node_id` contracted for `user_id`.
    pub fn contract(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<()> {
        self.repo.contract(user_id, node_id)
    }

    /// `None` addresses the implicit root, which is always expanded.
    pub fn is_expanded(&self, user_id: UserId, node_id: Option<NodeId>) -> OutlineResult<bool> {
        match node_id {
            Some(node_id) => self.repo.is_expanded(user_id, node_id),
            None => Ok(true),
        }
    }

    /// Underlying repository, for read paths that combine outline and
    /// expansion state.
    pub fn repository(&self) -> &E {
        &self.repo
    }
}
