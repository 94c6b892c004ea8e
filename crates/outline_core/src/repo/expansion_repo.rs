//! Per-user expansion state repository.
//!
//! # Invariants
//! - One row per `(user, node)`; expand and contract are idempotent.
//! - Rows of one user are never read or written on behalf of another.

use crate::model::node::NodeId;
use crate::model::scope::{Scope, UserId};
use crate::repo::error::OutlineResult;
use crate::repo::schema::{ensure_connection_ready, parse_uuid};
use rusqlite::{params, Connection};
use std::collections::HashSet;

const EXPANSION_COLUMNS: &[&str] = &["user_id", "node_uuid", "expanded_at"];

/// Repository interface for expansion state.
pub trait ExpansionRepository {
    /// Marks `node_id` expanded for `user_id`.
    fn expand(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<()>;
    /// Marks `node_id` contracted for `user_id`.
    fn contract(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<()>;
    fn is_expanded(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<bool>;
    /// Nodes of `scope` that `user_id` has expanded.
    fn expanded_in_scope(&self, user_id: UserId, scope: Scope) -> OutlineResult<HashSet<NodeId>>;
}

/// SQLite-backed expansion state repository.
pub struct SqliteExpansionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExpansionRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> OutlineResult<Self> {
        ensure_connection_ready(conn, "expanded_nodes", EXPANSION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ExpansionRepository for SqliteExpansionRepository<'_> {
    fn expand(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO expanded_nodes (user_id, node_uuid, expanded_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000));",
            params![user_id, node_id.to_string()],
        )?;
        Ok(())
    }

    fn contract(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<()> {
        self.conn.execute(
            "DELETE FROM expanded_nodes
             WHERE user_id = ?1 AND node_uuid = ?2;",
            params![user_id, node_id.to_string()],
        )?;
        Ok(())
    }

    fn is_expanded(&self, user_id: UserId, node_id: NodeId) -> OutlineResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM expanded_nodes
                WHERE user_id = ?1 AND node_uuid = ?2
            );",
            params![user_id, node_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn expanded_in_scope(&self, user_id: UserId, scope: Scope) -> OutlineResult<HashSet<NodeId>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.node_uuid
             FROM expanded_nodes e
             JOIN outline_nodes n ON n.node_uuid = e.node_uuid
             WHERE e.user_id = ?1
               AND n.owner_id = ?2
               AND n.tree_kind = ?3;",
        )?;
        let mut rows = stmt.query(params![user_id, scope.owner_id, scope.kind.as_str()])?;
        let mut expanded = HashSet::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            expanded.insert(parse_uuid(&value, "expanded_nodes.node_uuid")?);
        }
        Ok(expanded)
    }
}
