//! Position index manager: collision-free reassignment of ordering keys.
//!
//! # Responsibility
//! - Own the exclusive write lock that structural commands run under.
//! - Reassign node positions, node levels and item indexes without ever
//!   producing two rows with the same key, even momentarily.
//!
//! # Invariants
//! - Every primitive here requires a held [`WriteLock`]; none of them is safe
//!   to interleave with another structural command.
//! - Stored keys are positive outside of a running primitive. Negative keys
//!   are the parking area used while reassigning.
//! - Uniqueness is checked by SQLite row by row, so multi-row shifts are
//!   applied one row at a time in a collision-free order.

use crate::model::item::{ItemId, ItemIndex};
use crate::model::node::{NodeId, Position};
use crate::model::scope::Scope;
use crate::repo::error::{OutlineError, OutlineResult};
use crate::tree::PositionRange;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Exclusive write lock over the store, backed by an `IMMEDIATE` transaction.
///
/// Acquisition waits up to the connection busy timeout and then fails with
/// [`OutlineError::LockTimeout`]. Dropping the lock without [`commit`] rolls
/// back every write made under it.
///
/// [`commit`]: WriteLock::commit
pub struct WriteLock<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> WriteLock<'conn> {
    /// Blocks until the write lock is held or the busy timeout elapses.
    pub fn acquire(conn: &'conn Connection) -> OutlineResult<Self> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        Ok(Self { tx })
    }

    /// Connection view for reads and writes made under the lock.
    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    /// Publishes all writes and releases the lock.
    pub fn commit(self) -> OutlineResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

/// Adds `delta` to the position of every scope entry at or after `from`.
///
/// Rows are visited in descending position order for positive deltas and in
/// ascending order otherwise. Returns the number of shifted entries.
pub fn shift_tail(
    lock: &WriteLock<'_>,
    scope: Scope,
    from: Position,
    delta: i64,
) -> OutlineResult<usize> {
    if delta == 0 {
        return Ok(0);
    }

    let conn = lock.conn();
    let sql = if delta > 0 {
        "SELECT node_uuid
         FROM outline_nodes
         WHERE owner_id = ?1 AND tree_kind = ?2 AND position >= ?3
         ORDER BY position DESC;"
    } else {
        "SELECT node_uuid
         FROM outline_nodes
         WHERE owner_id = ?1 AND tree_kind = ?2 AND position >= ?3
         ORDER BY position ASC;"
    };
    let ids = {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(
            params![scope.owner_id, scope.kind.as_str(), from],
            |row| row.get::<_, String>(0),
        )?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    let mut stmt = conn.prepare(
        "UPDATE outline_nodes
         SET position = position + ?2
         WHERE node_uuid = ?1;",
    )?;
    for id in &ids {
        stmt.execute(params![id, delta])?;
    }
    Ok(ids.len())
}

/// Swaps two adjacent position ranges so `bottom` ends up before `top`.
///
/// `top` must end before `bottom` begins and no scope entry may lie between
/// them. Relative order inside each range is preserved and no entry outside
/// `top.begin..=bottom.end` is touched. Returns the number of moved entries.
pub fn exchange_ranges(
    lock: &WriteLock<'_>,
    scope: Scope,
    top: PositionRange,
    bottom: PositionRange,
) -> OutlineResult<usize> {
    if top.begin > top.end || bottom.begin > bottom.end || top.end >= bottom.begin {
        return Err(OutlineError::InvalidData(format!(
            "cannot exchange position ranges {}..={} and {}..={}",
            top.begin, top.end, bottom.begin, bottom.end
        )));
    }

    let conn = lock.conn();
    let owner_id = scope.owner_id;
    let kind = scope.kind.as_str();
    let between: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM outline_nodes
         WHERE owner_id = ?1 AND tree_kind = ?2
           AND position > ?3 AND position < ?4;",
        params![owner_id, kind, top.end, bottom.begin],
        |row| row.get(0),
    )?;
    if between != 0 {
        return Err(OutlineError::InvalidData(format!(
            "position ranges {}..={} and {}..={} are not adjacent",
            top.begin, top.end, bottom.begin, bottom.end
        )));
    }

    let diff_begin = bottom.begin - top.begin;
    let diff_end = bottom.end - top.end;

    let moved = conn.execute(
        "UPDATE outline_nodes
         SET position = -position
         WHERE owner_id = ?1 AND tree_kind = ?2
           AND position BETWEEN ?3 AND ?4;",
        params![owner_id, kind, top.begin, bottom.end],
    )?;
    conn.execute(
        "UPDATE outline_nodes
         SET position = -position + ?5,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE owner_id = ?1 AND tree_kind = ?2
           AND position BETWEEN ?3 AND ?4;",
        params![owner_id, kind, -top.end, -top.begin, diff_end],
    )?;
    conn.execute(
        "UPDATE outline_nodes
         SET position = -position - ?5,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE owner_id = ?1 AND tree_kind = ?2
           AND position BETWEEN ?3 AND ?4;",
        params![owner_id, kind, -bottom.end, -bottom.begin, diff_begin],
    )?;
    Ok(moved)
}

/// Adds `delta` to the level of every scope entry inside `range`.
///
/// Positions are untouched. Returns the number of updated entries.
pub fn shift_levels(
    lock: &WriteLock<'_>,
    scope: Scope,
    range: PositionRange,
    delta: i32,
) -> OutlineResult<usize> {
    let changed = lock.conn().execute(
        "UPDATE outline_nodes
         SET level = level + ?5,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE owner_id = ?1 AND tree_kind = ?2
           AND position BETWEEN ?3 AND ?4;",
        params![scope.owner_id, scope.kind.as_str(), range.begin, range.end, delta],
    )?;
    Ok(changed)
}

/// Swaps the indexes of two items owned by `node_id`.
///
/// `b` is parked on its negated index first, which no live item can hold.
pub fn exchange_single(
    lock: &WriteLock<'_>,
    node_id: NodeId,
    a: (ItemId, ItemIndex),
    b: (ItemId, ItemIndex),
) -> OutlineResult<()> {
    let conn = lock.conn();
    let (a_id, a_index) = a;
    let (b_id, b_index) = b;
    let node = node_id.to_string();

    let mut stmt = conn.prepare(
        "UPDATE attached_items
         SET item_index = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE item_uuid = ?1 AND node_uuid = ?2;",
    )?;
    for (id, index) in [(b_id, -b_index), (a_id, b_index), (b_id, a_index)] {
        if stmt.execute(params![id.to_string(), node, index])? == 0 {
            return Err(OutlineError::ItemNotFound(id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_db_in_memory;
    use crate::model::scope::TreeKind;

    fn seed(conn: &Connection, scope: Scope, rows: &[(Position, u32)]) {
        for (position, level) in rows {
            conn.execute(
                "INSERT INTO outline_nodes (node_uuid, owner_id, tree_kind, position, level, title, author_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1);",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    scope.owner_id,
                    scope.kind.as_str(),
                    position,
                    level,
                    format!("n{position}")
                ],
            )
            .unwrap();
        }
    }

    fn titles(conn: &Connection, scope: Scope) -> Vec<(Position, String)> {
        let mut stmt = conn
            .prepare(
                "SELECT position, title FROM outline_nodes
                 WHERE owner_id = ?1 AND tree_kind = ?2 ORDER BY position;",
            )
            .unwrap();
        let rows = stmt
            .query_map(params![scope.owner_id, scope.kind.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        rows
    }

    #[test]
    fn shift_tail_moves_without_collisions() {
        let conn = open_db_in_memory().unwrap();
        let scope = Scope::new(1, TreeKind::Program);
        seed(&conn, scope, &[(1, 1), (2, 1), (3, 1)]);

        let lock = WriteLock::acquire(&conn).unwrap();
        assert_eq!(shift_tail(&lock, scope, 2, 1).unwrap(), 2);
        lock.commit().unwrap();
        assert_eq!(
            titles(&conn, scope),
            [(1, "n1".to_string()), (3, "n2".to_string()), (4, "n3".to_string())]
        );
    }

    #[test]
    fn exchange_ranges_rejects_gap_entries() {
        let conn = open_db_in_memory().unwrap();
        let scope = Scope::new(1, TreeKind::Program);
        seed(&conn, scope, &[(1, 1), (2, 1), (3, 1)]);

        let lock = WriteLock::acquire(&conn).unwrap();
        let err = exchange_ranges(
            &lock,
            scope,
            PositionRange::new(1, 1),
            PositionRange::new(3, 3),
        )
        .unwrap_err();
        assert!(matches!(err, OutlineError::InvalidData(_)));
    }

    #[test]
    fn exchange_ranges_handles_unequal_widths_and_gaps() {
        let conn = open_db_in_memory().unwrap();
        let scope = Scope::new(1, TreeKind::Program);
        seed(&conn, scope, &[(1, 1), (5, 2), (6, 2), (9, 1), (20, 1)]);

        let lock = WriteLock::acquire(&conn).unwrap();
        let moved = exchange_ranges(
            &lock,
            scope,
            PositionRange::new(1, 6),
            PositionRange::new(9, 9),
        )
        .unwrap();
        lock.commit().unwrap();
        assert_eq!(moved, 4);
        assert_eq!(
            titles(&conn, scope),
            [
                (1, "n9".to_string()),
                (4, "n1".to_string()),
                (8, "n5".to_string()),
                (9, "n6".to_string()),
                (20, "n20".to_string())
            ]
        );
    }

    #[test]
    fn dropped_lock_rolls_back() {
        let conn = open_db_in_memory().unwrap();
        let scope = Scope::new(1, TreeKind::Faq);
        seed(&conn, scope, &[(1, 1), (2, 2)]);
        {
            let lock = WriteLock::acquire(&conn).unwrap();
            shift_levels(&lock, scope, PositionRange::new(2, 2), 1).unwrap();
        }
        let level: u32 = conn
            .query_row(
                "SELECT level FROM outline_nodes WHERE position = 2;",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(level, 2);
    }
}
