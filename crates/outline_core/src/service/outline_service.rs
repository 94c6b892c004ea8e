//! Outline tree use-case service.
//!
//! # Responsibility
//! - Validate user input and structural preconditions before any lock is
//!   taken, so rejected commands never wait on concurrent writers.
//! - Delegate every write to the repository, which repeats the structural
//!   check under the write lock.
//! - Emit one `outline_command` log event per write with identifiers only.
//!
//! # Invariants
//! - Titles are trimmed before persistence.
//! - A command rejected here has touched no rows.

use crate::model::node::{NodeFields, NodeId, OutlineNode};
use crate::model::scope::{OwnerId, Scope, UserId};
use crate::repo::error::{OutlineError, OutlineResult};
use crate::repo::expansion_repo::ExpansionRepository;
use crate::repo::outline_repo::{OutlineRepository, Removal};
use crate::tree::{
    can_move, locate, subtree_range, visible_outline, IndexRange, Movement, PositionRange,
    ViewMode, VisibleNode,
};
use log::{error, info, warn};
use std::time::Instant;

/// Outline tree service facade.
pub struct OutlineService<R: OutlineRepository> {
    repo: R,
}

impl<R: OutlineRepository> OutlineService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Full node sequence of one scope in position order.
    pub fn list_scope(&self, scope: Scope) -> OutlineResult<Vec<OutlineNode>> {
        self.repo.list_scope(scope)
    }

    pub fn get_node(&self, scope: Scope, node_id: NodeId) -> OutlineResult<OutlineNode> {
        self.repo
            .get_node(scope, node_id)?
            .ok_or(OutlineError::NodeNotFound(node_id))
    }

    pub fn count_nodes(&self, scope: Scope) -> OutlineResult<usize> {
        self.repo.count_nodes(scope)
    }

    /// Positions spanned by `node_id` and all its descendants.
    pub fn get_subtree_range(&self, scope: Scope, node_id: NodeId) -> OutlineResult<PositionRange> {
        let nodes = self.repo.list_scope(scope)?;
        let range = subtree_of(&nodes, node_id)?;
        Ok(PositionRange::of(&nodes, range))
    }

    /// Creates a node as last child of `parent`, or as last top-level node.
    pub fn insert(
        &self,
        scope: Scope,
        parent: Option<NodeId>,
        fields: &NodeFields,
        author_id: UserId,
    ) -> OutlineResult<OutlineNode> {
        let started_at = Instant::now();
        let result = fields.normalized().map_err(OutlineError::from).and_then(|fields| {
            if let Some(parent_id) = parent {
                if self.repo.get_node(scope, parent_id)?.is_none() {
                    return Err(OutlineError::InvalidParent(parent_id));
                }
            }
            self.repo.insert_node(scope, parent, &fields, author_id)
        });
        let target = result.as_ref().ok().map(|node| node.node_id);
        log_command("insert", scope, target.or(parent), started_at, &result);
        result
    }

    /// Replaces title, body and time range of one node.
    pub fn update(
        &self,
        scope: Scope,
        node_id: NodeId,
        fields: &NodeFields,
    ) -> OutlineResult<OutlineNode> {
        let started_at = Instant::now();
        let result = fields
            .normalized()
            .map_err(OutlineError::from)
            .and_then(|fields| self.repo.update_node(scope, node_id, &fields));
        log_command("update", scope, Some(node_id), started_at, &result);
        result
    }

    /// Deletes one node, its descendants, their items and expansion entries.
    pub fn delete_subtree(&self, scope: Scope, node_id: NodeId) -> OutlineResult<Removal> {
        let started_at = Instant::now();
        let result = self
            .get_node(scope, node_id)
            .and_then(|_| self.repo.delete_subtree(scope, node_id));
        log_command("delete_subtree", scope, Some(node_id), started_at, &result);
        result
    }

    /// Swaps the subtree of `node_id` with the preceding sibling subtree.
    pub fn move_up(&self, scope: Scope, node_id: NodeId) -> OutlineResult<()> {
        self.move_node(scope, node_id, Movement::Up)
    }

    /// Swaps the subtree of `node_id` with the following sibling subtree.
    pub fn move_down(&self, scope: Scope, node_id: NodeId) -> OutlineResult<()> {
        self.move_node(scope, node_id, Movement::Down)
    }

    /// Outdents the subtree of `node_id` by one level.
    pub fn move_left(&self, scope: Scope, node_id: NodeId) -> OutlineResult<()> {
        self.move_node(scope, node_id, Movement::Left)
    }

    /// Indents the subtree of `node_id` under its preceding sibling.
    pub fn move_right(&self, scope: Scope, node_id: NodeId) -> OutlineResult<()> {
        self.move_node(scope, node_id, Movement::Right)
    }

    pub fn hide(&self, scope: Scope, node_id: NodeId) -> OutlineResult<()> {
        self.set_hidden(scope, node_id, true)
    }

    pub fn unhide(&self, scope: Scope, node_id: NodeId) -> OutlineResult<()> {
        self.set_hidden(scope, node_id, false)
    }

    /// Deletes every node of one scope.
    pub fn delete_scope(&self, scope: Scope) -> OutlineResult<Removal> {
        let started_at = Instant::now();
        let result = self.repo.delete_scope(scope);
        log_command("delete_scope", scope, None, started_at, &result);
        result
    }

    /// Deletes every outline of one owner.
    pub fn delete_owner(&self, owner_id: OwnerId) -> OutlineResult<Removal> {
        let started_at = Instant::now();
        let result = self.repo.delete_owner(owner_id);
        let subject = format!("owner_id={owner_id}");
        log_outcome("outline", "delete_owner", &subject, started_at, &result);
        result
    }

    /// Rows `user_id` sees for one scope, numbered in display order.
    pub fn list_visible<E: ExpansionRepository>(
        &self,
        expansion: &E,
        scope: Scope,
        user_id: UserId,
        mode: ViewMode,
    ) -> OutlineResult<Vec<VisibleNode>> {
        let nodes = self.repo.list_scope(scope)?;
        let expanded = expansion.expanded_in_scope(user_id, scope)?;
        Ok(visible_outline(
            &nodes,
            |node| expanded.contains(&node.node_id),
            mode,
        ))
    }

    fn move_node(&self, scope: Scope, node_id: NodeId, movement: Movement) -> OutlineResult<()> {
        let started_at = Instant::now();
        let result = self.check_movement(scope, node_id, movement).and_then(|()| {
            self.repo.move_node(scope, node_id, movement)
        });
        log_command(movement_event(movement), scope, Some(node_id), started_at, &result);
        result
    }

    fn check_movement(&self, scope: Scope, node_id: NodeId, movement: Movement) -> OutlineResult<()> {
        let nodes = self.repo.list_scope(scope)?;
        let index = locate(&nodes, node_id).ok_or(OutlineError::NodeNotFound(node_id))?;
        if !can_move(&nodes, index, movement) {
            return Err(OutlineError::MovementNotAllowed {
                target: node_id,
                movement,
            });
        }
        Ok(())
    }

    fn set_hidden(&self, scope: Scope, node_id: NodeId, hidden: bool) -> OutlineResult<()> {
        let started_at = Instant::now();
        let result = self.repo.set_hidden(scope, node_id, hidden);
        let command = if hidden { "hide" } else { "unhide" };
        log_command(command, scope, Some(node_id), started_at, &result);
        result
    }
}

/// Index bounds of the subtree rooted at `node_id` inside `nodes`.
pub fn subtree_of(nodes: &[OutlineNode], node_id: NodeId) -> OutlineResult<IndexRange> {
    let index = locate(nodes, node_id).ok_or(OutlineError::NodeNotFound(node_id))?;
    Ok(subtree_range(nodes, index))
}

fn movement_event(movement: Movement) -> &'static str {
    match movement {
        Movement::Up => "move_up",
        Movement::Down => "move_down",
        Movement::Left => "move_left",
        Movement::Right => "move_right",
    }
}

/// Whether `err` is a user-facing rejection rather than a fault.
fn is_rejection(err: &OutlineError) -> bool {
    matches!(
        err,
        OutlineError::Validation(_)
            | OutlineError::NodeNotFound(_)
            | OutlineError::ItemNotFound(_)
            | OutlineError::InvalidParent(_)
            | OutlineError::MovementNotAllowed { .. }
    )
}

pub(crate) fn log_outcome<T>(
    module: &str,
    command: &str,
    subject: &str,
    started_at: Instant,
    result: &OutlineResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event=outline_command module={module} status=ok command={command} {subject} duration_ms={duration_ms}"
        ),
        Err(err) if is_rejection(err) => info!(
            "event=outline_command module={module} status=rejected command={command} {subject} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
        Err(err) if err.is_retryable() => warn!(
            "event=outline_command module={module} status=error command={command} {subject} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
        Err(err) => error!(
            "event=outline_command module={module} status=error command={command} {subject} duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            err
        ),
    }
}

fn log_command<T>(
    command: &str,
    scope: Scope,
    node_id: Option<NodeId>,
    started_at: Instant,
    result: &OutlineResult<T>,
) {
    let subject = match node_id {
        Some(node_id) => format!("scope={scope} node_id={node_id}"),
        None => format!("scope={scope}"),
    };
    log_outcome("outline", command, &subject, started_at, result);
}
