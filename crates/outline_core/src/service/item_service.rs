//! Attached item use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/reorder/hide entry points for items.
//! - Reject impossible reorders before the repository takes the write lock.

use crate::model::item::{AttachedItem, ItemId};
use crate::model::node::NodeId;
use crate::repo::error::{OutlineError, OutlineResult};
use crate::repo::item_repo::ItemRepository;
use crate::service::outline_service::log_outcome;
use crate::tree::Movement;
use std::marker::PhantomData;
use std::time::Instant;

/// Attached item service facade for payload type `P`.
pub struct ItemService<R: ItemRepository<P>, P> {
    repo: R,
    payload: PhantomData<fn() -> P>,
}

impl<R: ItemRepository<P>, P> ItemService<R, P> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            payload: PhantomData,
        }
    }

    /// Appends one item to `node_id`.
    pub fn create(&self, node_id: NodeId, payload: &P) -> OutlineResult<AttachedItem<P>> {
        let started_at = Instant::now();
        let result = self.repo.create_item(node_id, payload);
        let subject = match &result {
            Ok(item) => format!("node_id={node_id} item_id={}", item.item_id),
            Err(_) => format!("node_id={node_id}"),
        };
        log_outcome("item", "create_item", &subject, started_at, &result);
        result
    }

    pub fn get(&self, item_id: ItemId) -> OutlineResult<AttachedItem<P>> {
        self.repo
            .get_item(item_id)?
            .ok_or(OutlineError::ItemNotFound(item_id))
    }

    /// Items of `node_id` in index order.
    pub fn list(&self, node_id: NodeId, include_hidden: bool) -> OutlineResult<Vec<AttachedItem<P>>> {
        self.repo.list_items(node_id, include_hidden)
    }

    pub fn update(&self, item_id: ItemId, payload: &P) -> OutlineResult<AttachedItem<P>> {
        let started_at = Instant::now();
        let result = self.repo.update_item(item_id, payload);
        log_item("update_item", item_id, started_at, &result);
        result
    }

    pub fn delete(&self, item_id: ItemId) -> OutlineResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete_item(item_id);
        log_item("delete_item", item_id, started_at, &result);
        result
    }

    pub fn hide(&self, item_id: ItemId) -> OutlineResult<()> {
        let started_at = Instant::now();
        let result = self.repo.set_item_hidden(item_id, true);
        log_item("hide_item", item_id, started_at, &result);
        result
    }

    pub fn unhide(&self, item_id: ItemId) -> OutlineResult<()> {
        let started_at = Instant::now();
        let result = self.repo.set_item_hidden(item_id, false);
        log_item("unhide_item", item_id, started_at, &result);
        result
    }

    /// Swaps one item with the item right before it.
    pub fn move_up(&self, item_id: ItemId) -> OutlineResult<()> {
        self.move_item(item_id, Movement::Up, "move_item_up")
    }

    /// Swaps one item with the item right after it.
    pub fn move_down(&self, item_id: ItemId) -> OutlineResult<()> {
        self.move_item(item_id, Movement::Down, "move_item_down")
    }

    fn move_item(&self, item_id: ItemId, movement: Movement, command: &str) -> OutlineResult<()> {
        let started_at = Instant::now();
        let result = self
            .check_neighbour(item_id, movement)
            .and_then(|()| self.repo.move_item(item_id, movement));
        log_item(command, item_id, started_at, &result);
        result
    }

    fn check_neighbour(&self, item_id: ItemId, movement: Movement) -> OutlineResult<()> {
        let item = self.get(item_id)?;
        let siblings = self.repo.list_items(item.node_id, true)?;
        let has_neighbour = match movement {
            Movement::Up => siblings.iter().any(|other| other.index < item.index),
            Movement::Down => siblings.iter().any(|other| other.index > item.index),
            Movement::Left | Movement::Right => false,
        };
        if !has_neighbour {
            return Err(OutlineError::MovementNotAllowed {
                target: item_id,
                movement,
            });
        }
        Ok(())
    }
}

fn log_item<T>(command: &str, item_id: ItemId, started_at: Instant, result: &OutlineResult<T>) {
    let subject = format!("item_id={item_id}");
    log_outcome("item", command, &subject, started_at, result);
}
