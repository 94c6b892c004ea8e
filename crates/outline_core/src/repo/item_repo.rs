//! Attached item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist per-node ordered leaf items with an opaque JSON payload.
//! - Reorder items by exchanging the indexes of two neighbours.
//!
//! # Invariants
//! - Listing is deterministic: `item_index ASC`.
//! - New items are appended with `MAX(item_index) + 1` in a single statement,
//!   so concurrent creates never share an index.
//! - Payloads round-trip through `serde_json` and are never inspected.

use crate::model::item::{AttachedItem, ItemId, ItemIndex};
use crate::model::node::NodeId;
use crate::repo::error::{OutlineError, OutlineResult};
use crate::repo::position_index::{exchange_single, WriteLock};
use crate::repo::schema::{bool_to_int, ensure_connection_ready, parse_flag, parse_uuid};
use crate::tree::Movement;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use uuid::Uuid;

const ITEM_COLUMNS: &[&str] = &[
    "item_uuid",
    "node_uuid",
    "item_index",
    "is_hidden",
    "payload",
    "created_at",
    "updated_at",
];

const SELECT_ITEM: &str = "SELECT
    item_uuid,
    node_uuid,
    item_index,
    is_hidden,
    payload,
    created_at,
    updated_at
 FROM attached_items";

/// Repository interface for attached item operations.
pub trait ItemRepository<P> {
    /// Appends one item after the last item of `node_id`.
    fn create_item(&self, node_id: NodeId, payload: &P) -> OutlineResult<AttachedItem<P>>;
    /// Loads one item by id.
    fn get_item(&self, item_id: ItemId) -> OutlineResult<Option<AttachedItem<P>>>;
    /// Lists items of one node in index order.
    fn list_items(&self, node_id: NodeId, include_hidden: bool)
        -> OutlineResult<Vec<AttachedItem<P>>>;
    /// Replaces the payload of one item.
    fn update_item(&self, item_id: ItemId, payload: &P) -> OutlineResult<AttachedItem<P>>;
    /// Sets the hidden flag of one item.
    fn set_item_hidden(&self, item_id: ItemId, hidden: bool) -> OutlineResult<()>;
    /// Deletes one item. Remaining indexes are left as they are.
    fn delete_item(&self, item_id: ItemId) -> OutlineResult<()>;
    /// Swaps one item with its previous (`Up`) or next (`Down`) neighbour.
    fn move_item(&self, item_id: ItemId, movement: Movement) -> OutlineResult<()>;
}

/// SQLite-backed attached item repository for payload type `P`.
pub struct SqliteItemRepository<'conn, P> {
    conn: &'conn Connection,
    payload: PhantomData<fn() -> P>,
}

impl<'conn, P> SqliteItemRepository<'conn, P> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> OutlineResult<Self> {
        ensure_connection_ready(conn, "attached_items", ITEM_COLUMNS)?;
        Ok(Self {
            conn,
            payload: PhantomData,
        })
    }
}

impl<P> ItemRepository<P> for SqliteItemRepository<'_, P>
where
    P: Serialize + DeserializeOwned,
{
    fn create_item(&self, node_id: NodeId, payload: &P) -> OutlineResult<AttachedItem<P>> {
        let item_id = Uuid::new_v4();
        let payload = serde_json::to_string(payload)?;
        let inserted = self.conn.execute(
            "INSERT INTO attached_items (item_uuid, node_uuid, item_index, is_hidden, payload)
             SELECT
                ?1,
                n.node_uuid,
                (SELECT COALESCE(MAX(i.item_index), 0) + 1
                 FROM attached_items i
                 WHERE i.node_uuid = n.node_uuid),
                0,
                ?3
             FROM outline_nodes n
             WHERE n.node_uuid = ?2;",
            params![item_id.to_string(), node_id.to_string(), payload],
        )?;
        if inserted == 0 {
            return Err(OutlineError::NodeNotFound(node_id));
        }
        load_required_item(self.conn, item_id)
    }

    fn get_item(&self, item_id: ItemId) -> OutlineResult<Option<AttachedItem<P>>> {
        load_item(self.conn, item_id)
    }

    fn list_items(
        &self,
        node_id: NodeId,
        include_hidden: bool,
    ) -> OutlineResult<Vec<AttachedItem<P>>> {
        let sql = if include_hidden {
            format!(
                "{SELECT_ITEM}
                 WHERE node_uuid = ?1
                 ORDER BY item_index ASC;"
            )
        } else {
            format!(
                "{SELECT_ITEM}
                 WHERE node_uuid = ?1 AND is_hidden = 0
                 ORDER BY item_index ASC;"
            )
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([node_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn update_item(&self, item_id: ItemId, payload: &P) -> OutlineResult<AttachedItem<P>> {
        let payload = serde_json::to_string(payload)?;
        let changed = self.conn.execute(
            "UPDATE attached_items
             SET payload = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE item_uuid = ?1;",
            params![item_id.to_string(), payload],
        )?;
        if changed == 0 {
            return Err(OutlineError::ItemNotFound(item_id));
        }
        load_required_item(self.conn, item_id)
    }

    fn set_item_hidden(&self, item_id: ItemId, hidden: bool) -> OutlineResult<()> {
        let changed = self.conn.execute(
            "UPDATE attached_items
             SET is_hidden = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE item_uuid = ?1;",
            params![item_id.to_string(), bool_to_int(hidden)],
        )?;
        if changed == 0 {
            return Err(OutlineError::ItemNotFound(item_id));
        }
        Ok(())
    }

    fn delete_item(&self, item_id: ItemId) -> OutlineResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM attached_items WHERE item_uuid = ?1;",
            [item_id.to_string()],
        )?;
        if changed == 0 {
            return Err(OutlineError::ItemNotFound(item_id));
        }
        Ok(())
    }

    fn move_item(&self, item_id: ItemId, movement: Movement) -> OutlineResult<()> {
        let lock = WriteLock::acquire(self.conn)?;
        let (node_id, index) = item_slot(lock.conn(), item_id)?
            .ok_or(OutlineError::ItemNotFound(item_id))?;
        let neighbour = neighbour_slot(lock.conn(), node_id, index, movement)?.ok_or(
            OutlineError::MovementNotAllowed {
                target: item_id,
                movement,
            },
        )?;
        exchange_single(&lock, node_id, (item_id, index), neighbour)?;
        lock.commit()
    }
}

/// Owning node and index of one item.
fn item_slot(
    conn: &Connection,
    item_id: ItemId,
) -> OutlineResult<Option<(NodeId, ItemIndex)>> {
    let slot: Option<(String, ItemIndex)> = conn
        .query_row(
            "SELECT node_uuid, item_index
             FROM attached_items
             WHERE item_uuid = ?1;",
            [item_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    match slot {
        Some((node_id, index)) => Ok(Some((
            parse_uuid(&node_id, "attached_items.node_uuid")?,
            index,
        ))),
        None => Ok(None),
    }
}

/// Closest item of the same node in the direction of `movement`.
///
/// Only `Up` and `Down` have a neighbour; other movements yield `None`.
fn neighbour_slot(
    conn: &Connection,
    node_id: NodeId,
    index: ItemIndex,
    movement: Movement,
) -> OutlineResult<Option<(ItemId, ItemIndex)>> {
    let sql = match movement {
        Movement::Up => {
            "SELECT item_uuid, item_index
             FROM attached_items
             WHERE node_uuid = ?1 AND item_index < ?2
             ORDER BY item_index DESC
             LIMIT 1;"
        }
        Movement::Down => {
            "SELECT item_uuid, item_index
             FROM attached_items
             WHERE node_uuid = ?1 AND item_index > ?2
             ORDER BY item_index ASC
             LIMIT 1;"
        }
        Movement::Left | Movement::Right => return Ok(None),
    };
    let slot: Option<(String, ItemIndex)> = conn
        .query_row(sql, params![node_id.to_string(), index], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()?;
    match slot {
        Some((item_id, index)) => Ok(Some((
            parse_uuid(&item_id, "attached_items.item_uuid")?,
            index,
        ))),
        None => Ok(None),
    }
}

fn load_item<P: DeserializeOwned>(
    conn: &Connection,
    item_id: ItemId,
) -> OutlineResult<Option<AttachedItem<P>>> {
    let mut stmt = conn.prepare(&format!("{SELECT_ITEM} WHERE item_uuid = ?1;"))?;
    let mut rows = stmt.query([item_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_item_row(row)?));
    }
    Ok(None)
}

fn load_required_item<P: DeserializeOwned>(
    conn: &Connection,
    item_id: ItemId,
) -> OutlineResult<AttachedItem<P>> {
    load_item(conn, item_id)?.ok_or(OutlineError::ItemNotFound(item_id))
}

fn parse_item_row<P: DeserializeOwned>(row: &Row<'_>) -> OutlineResult<AttachedItem<P>> {
    let item_id: String = row.get("item_uuid")?;
    let node_id: String = row.get("node_uuid")?;
    let is_hidden: i64 = row.get("is_hidden")?;
    let payload: String = row.get("payload")?;

    Ok(AttachedItem {
        item_id: parse_uuid(&item_id, "attached_items.item_uuid")?,
        node_id: parse_uuid(&node_id, "attached_items.node_uuid")?,
        index: row.get("item_index")?,
        is_hidden: parse_flag(is_hidden, "attached_items.is_hidden")?,
        payload: serde_json::from_str(&payload)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
