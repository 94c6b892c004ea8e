//! Outline node repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist outline nodes of one scope as a flat `(position, level)` sequence.
//! - Run every structural command as one unit under the write lock, re-checking
//!   its precondition against rows read under that lock.
//!
//! # Invariants
//! - Listing is deterministic: `position ASC`.
//! - Deleting nodes also deletes their attached items and expansion entries.
//! - A rejected command leaves every row untouched.

use crate::model::node::{Level, NodeFields, NodeId, OutlineNode, Position, TimeRange};
use crate::model::scope::{OwnerId, Scope, TreeKind, UserId};
use crate::repo::error::{OutlineError, OutlineResult};
use crate::repo::position_index::{exchange_ranges, shift_levels, shift_tail, WriteLock};
use crate::repo::schema::{bool_to_int, ensure_connection_ready, parse_flag, parse_uuid};
use crate::tree::{
    last_descendant, locate, next_sibling, prev_sibling, subtree_range, Movement, PositionRange,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const NODE_COLUMNS: &[&str] = &[
    "node_uuid",
    "owner_id",
    "tree_kind",
    "position",
    "level",
    "title",
    "body",
    "is_hidden",
    "author_id",
    "start_at",
    "end_at",
    "created_at",
    "updated_at",
];

const SELECT_NODE: &str = "SELECT
    node_uuid,
    owner_id,
    tree_kind,
    position,
    level,
    title,
    body,
    is_hidden,
    author_id,
    start_at,
    end_at,
    created_at,
    updated_at
 FROM outline_nodes";

/// Row counts removed by a delete command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removal {
    pub nodes: usize,
    pub items: usize,
    pub expansions: usize,
}

/// Repository interface for outline node operations.
pub trait OutlineRepository {
    /// Loads the full node sequence of one scope in position order.
    fn list_scope(&self, scope: Scope) -> OutlineResult<Vec<OutlineNode>>;
    /// Loads one node of `scope` by id.
    fn get_node(&self, scope: Scope, node_id: NodeId) -> OutlineResult<Option<OutlineNode>>;
    /// Number of nodes in one scope.
    fn count_nodes(&self, scope: Scope) -> OutlineResult<usize>;
    /// Creates a node as last child of `parent`, or as last top-level node.
    fn insert_node(
        &self,
        scope: Scope,
        parent: Option<NodeId>,
        fields: &NodeFields,
        author_id: UserId,
    ) -> OutlineResult<OutlineNode>;
    /// Replaces the editable fields of one node.
    fn update_node(
        &self,
        scope: Scope,
        node_id: NodeId,
        fields: &NodeFields,
    ) -> OutlineResult<OutlineNode>;
    /// Sets the hidden flag of one node.
    fn set_hidden(&self, scope: Scope, node_id: NodeId, hidden: bool) -> OutlineResult<()>;
    /// Deletes one node with all its descendants.
    fn delete_subtree(&self, scope: Scope, node_id: NodeId) -> OutlineResult<Removal>;
    /// Applies one structural movement to the subtree rooted at `node_id`.
    fn move_node(&self, scope: Scope, node_id: NodeId, movement: Movement) -> OutlineResult<()>;
    /// Deletes every node of one scope.
    fn delete_scope(&self, scope: Scope) -> OutlineResult<Removal>;
    /// Deletes every node of every tree kind of one owner.
    fn delete_owner(&self, owner_id: OwnerId) -> OutlineResult<Removal>;
}

/// SQLite-backed outline repository.
pub struct SqliteOutlineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutlineRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> OutlineResult<Self> {
        ensure_connection_ready(conn, "outline_nodes", NODE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl OutlineRepository for SqliteOutlineRepository<'_> {
    fn list_scope(&self, scope: Scope) -> OutlineResult<Vec<OutlineNode>> {
        load_scope(self.conn, scope)
    }

    fn get_node(&self, scope: Scope, node_id: NodeId) -> OutlineResult<Option<OutlineNode>> {
        load_node(self.conn, scope, node_id)
    }

    fn count_nodes(&self, scope: Scope) -> OutlineResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM outline_nodes
             WHERE owner_id = ?1 AND tree_kind = ?2;",
            params![scope.owner_id, scope.kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert_node(
        &self,
        scope: Scope,
        parent: Option<NodeId>,
        fields: &NodeFields,
        author_id: UserId,
    ) -> OutlineResult<OutlineNode> {
        fields.validate()?;

        let lock = WriteLock::acquire(self.conn)?;
        let nodes = load_scope(lock.conn(), scope)?;
        let (position, level) = match parent {
            Some(parent_id) => {
                let parent_index =
                    locate(&nodes, parent_id).ok_or(OutlineError::InvalidParent(parent_id))?;
                let last = last_descendant(&nodes, parent_index);
                let position = nodes[last].position + 1;
                if nodes
                    .get(last + 1)
                    .is_some_and(|next| next.position == position)
                {
                    shift_tail(&lock, scope, position, 1)?;
                }
                (position, nodes[parent_index].level + 1)
            }
            None => (nodes.last().map_or(1, |last| last.position + 1), 1),
        };

        let node_id = Uuid::new_v4();
        lock.conn().execute(
            "INSERT INTO outline_nodes (
                node_uuid,
                owner_id,
                tree_kind,
                position,
                level,
                title,
                body,
                is_hidden,
                author_id,
                start_at,
                end_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10);",
            params![
                node_id.to_string(),
                scope.owner_id,
                scope.kind.as_str(),
                position,
                level,
                fields.title,
                fields.body,
                author_id,
                fields.time_range.map(|range| range.start_ms),
                fields.time_range.map(|range| range.end_ms),
            ],
        )?;
        let node = load_required_node(lock.conn(), scope, node_id)?;
        lock.commit()?;
        Ok(node)
    }

    fn update_node(
        &self,
        scope: Scope,
        node_id: NodeId,
        fields: &NodeFields,
    ) -> OutlineResult<OutlineNode> {
        fields.validate()?;
        let changed = self.conn.execute(
            "UPDATE outline_nodes
             SET title = ?4,
                 body = ?5,
                 start_at = ?6,
                 end_at = ?7,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE node_uuid = ?1 AND owner_id = ?2 AND tree_kind = ?3;",
            params![
                node_id.to_string(),
                scope.owner_id,
                scope.kind.as_str(),
                fields.title,
                fields.body,
                fields.time_range.map(|range| range.start_ms),
                fields.time_range.map(|range| range.end_ms),
            ],
        )?;
        if changed == 0 {
            return Err(OutlineError::NodeNotFound(node_id));
        }
        load_required_node(self.conn, scope, node_id)
    }

    fn set_hidden(&self, scope: Scope, node_id: NodeId, hidden: bool) -> OutlineResult<()> {
        let changed = self.conn.execute(
            "UPDATE outline_nodes
             SET is_hidden = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE node_uuid = ?1 AND owner_id = ?2 AND tree_kind = ?3;",
            params![
                node_id.to_string(),
                scope.owner_id,
                scope.kind.as_str(),
                bool_to_int(hidden),
            ],
        )?;
        if changed == 0 {
            return Err(OutlineError::NodeNotFound(node_id));
        }
        Ok(())
    }

    fn delete_subtree(&self, scope: Scope, node_id: NodeId) -> OutlineResult<Removal> {
        let lock = WriteLock::acquire(self.conn)?;
        let nodes = load_scope(lock.conn(), scope)?;
        let index = locate(&nodes, node_id).ok_or(OutlineError::NodeNotFound(node_id))?;
        let range = subtree_range(&nodes, index);
        let ids: Vec<NodeId> = nodes[range.begin..=range.end]
            .iter()
            .map(|node| node.node_id)
            .collect();
        let removal = remove_nodes(lock.conn(), &ids)?;
        lock.commit()?;
        Ok(removal)
    }

    fn move_node(&self, scope: Scope, node_id: NodeId, movement: Movement) -> OutlineResult<()> {
        let lock = WriteLock::acquire(self.conn)?;
        let nodes = load_scope(lock.conn(), scope)?;
        let index = locate(&nodes, node_id).ok_or(OutlineError::NodeNotFound(node_id))?;
        let not_allowed = || OutlineError::MovementNotAllowed {
            target: node_id,
            movement,
        };
        let own = PositionRange::of(&nodes, subtree_range(&nodes, index));

        match movement {
            Movement::Up => {
                let sibling = prev_sibling(&nodes, index).ok_or_else(not_allowed)?;
                let top = PositionRange::of(&nodes, subtree_range(&nodes, sibling));
                exchange_ranges(&lock, scope, top, own)?;
            }
            Movement::Down => {
                let sibling = next_sibling(&nodes, index).ok_or_else(not_allowed)?;
                let bottom = PositionRange::of(&nodes, subtree_range(&nodes, sibling));
                exchange_ranges(&lock, scope, own, bottom)?;
            }
            Movement::Left => {
                if nodes[index].level <= 1 {
                    return Err(not_allowed());
                }
                shift_levels(&lock, scope, own, -1)?;
            }
            Movement::Right => {
                prev_sibling(&nodes, index).ok_or_else(not_allowed)?;
                shift_levels(&lock, scope, own, 1)?;
            }
        }

        lock.commit()
    }

    fn delete_scope(&self, scope: Scope) -> OutlineResult<Removal> {
        let lock = WriteLock::acquire(self.conn)?;
        let ids: Vec<NodeId> = load_scope(lock.conn(), scope)?
            .into_iter()
            .map(|node| node.node_id)
            .collect();
        let removal = remove_nodes(lock.conn(), &ids)?;
        lock.commit()?;
        Ok(removal)
    }

    fn delete_owner(&self, owner_id: OwnerId) -> OutlineResult<Removal> {
        let lock = WriteLock::acquire(self.conn)?;
        let ids = {
            let mut stmt = lock.conn().prepare(
                "SELECT node_uuid
                 FROM outline_nodes
                 WHERE owner_id = ?1;",
            )?;
            let mut rows = stmt.query([owner_id])?;
            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                let value: String = row.get(0)?;
                ids.push(parse_uuid(&value, "outline_nodes.node_uuid")?);
            }
            ids
        };
        let removal = remove_nodes(lock.conn(), &ids)?;
        lock.commit()?;
        Ok(removal)
    }
}

/// Loads the node sequence of `scope` ordered by position.
pub(crate) fn load_scope(conn: &Connection, scope: Scope) -> OutlineResult<Vec<OutlineNode>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_NODE}
         WHERE owner_id = ?1 AND tree_kind = ?2
         ORDER BY position ASC;"
    ))?;
    let mut rows = stmt.query(params![scope.owner_id, scope.kind.as_str()])?;
    let mut nodes = Vec::new();
    while let Some(row) = rows.next()? {
        nodes.push(parse_node_row(row)?);
    }
    Ok(nodes)
}

fn load_node(conn: &Connection, scope: Scope, node_id: NodeId) -> OutlineResult<Option<OutlineNode>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_NODE}
         WHERE node_uuid = ?1 AND owner_id = ?2 AND tree_kind = ?3;"
    ))?;
    let mut rows = stmt.query(params![
        node_id.to_string(),
        scope.owner_id,
        scope.kind.as_str()
    ])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_node_row(row)?));
    }
    Ok(None)
}

fn load_required_node(conn: &Connection, scope: Scope, node_id: NodeId) -> OutlineResult<OutlineNode> {
    load_node(conn, scope, node_id)?.ok_or(OutlineError::NodeNotFound(node_id))
}

/// Deletes nodes with their items and expansion entries. Items go first
/// because they reference their node.
fn remove_nodes(conn: &Connection, ids: &[NodeId]) -> OutlineResult<Removal> {
    let mut removal = Removal::default();
    let mut delete_items = conn.prepare("DELETE FROM attached_items WHERE node_uuid = ?1;")?;
    let mut delete_expansions = conn.prepare("DELETE FROM expanded_nodes WHERE node_uuid = ?1;")?;
    let mut delete_node = conn.prepare("DELETE FROM outline_nodes WHERE node_uuid = ?1;")?;
    for id in ids {
        let key = id.to_string();
        removal.items += delete_items.execute([&key])?;
        removal.expansions += delete_expansions.execute([&key])?;
        removal.nodes += delete_node.execute([&key])?;
    }
    Ok(removal)
}

fn parse_node_row(row: &Row<'_>) -> OutlineResult<OutlineNode> {
    let node_id: String = row.get("node_uuid")?;
    let kind: String = row.get("tree_kind")?;
    let position: Position = row.get("position")?;
    let level: i64 = row.get("level")?;
    let is_hidden: i64 = row.get("is_hidden")?;
    let start_at: Option<i64> = row.get("start_at")?;
    let end_at: Option<i64> = row.get("end_at")?;

    let kind = TreeKind::parse(&kind)
        .ok_or_else(|| OutlineError::InvalidData(format!("unknown tree kind `{kind}`")))?;
    let level = Level::try_from(level)
        .ok()
        .filter(|level| *level >= 1)
        .ok_or_else(|| OutlineError::InvalidData(format!("invalid level `{level}`")))?;
    let time_range = match (start_at, end_at) {
        (Some(start_ms), Some(end_ms)) => Some(TimeRange::new(start_ms, end_ms)),
        (None, None) => None,
        _ => {
            return Err(OutlineError::InvalidData(format!(
                "incomplete time range on node `{node_id}`"
            )))
        }
    };

    Ok(OutlineNode {
        node_id: parse_uuid(&node_id, "outline_nodes.node_uuid")?,
        scope: Scope::new(row.get("owner_id")?, kind),
        position,
        level,
        title: row.get("title")?,
        body: row.get("body")?,
        is_hidden: parse_flag(is_hidden, "outline_nodes.is_hidden")?,
        author_id: row.get("author_id")?,
        time_range,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
