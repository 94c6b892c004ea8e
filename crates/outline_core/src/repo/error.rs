//! Error taxonomy shared by outline repositories and services.

use crate::db::DbError;
use crate::model::item::ItemId;
use crate::model::node::{NodeId, ValidationError};
use crate::tree::{Movement, ShapeError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by outline store operations.
pub type OutlineResult<T> = Result<T, OutlineError>;

/// Errors from outline store operations.
#[derive(Debug)]
pub enum OutlineError {
    /// Field validation failed; nothing was written.
    Validation(ValidationError),
    /// Target node does not exist in the addressed scope.
    NodeNotFound(NodeId),
    /// Target attached item does not exist.
    ItemNotFound(ItemId),
    /// Supplied parent does not resolve inside the target scope.
    InvalidParent(NodeId),
    /// Structural precondition of a move failed; nothing was written.
    MovementNotAllowed { target: Uuid, movement: Movement },
    /// The exclusive write lock could not be acquired in time. Retryable.
    LockTimeout,
    /// Underlying SQLite/bootstrap failure. The command had no effect.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl OutlineError {
    /// Whether the caller may retry the whole command.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout)
    }

    /// Short stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NodeNotFound(_) => "node_not_found",
            Self::ItemNotFound(_) => "item_not_found",
            Self::InvalidParent(_) => "invalid_parent",
            Self::MovementNotAllowed { .. } => "movement_not_allowed",
            Self::LockTimeout => "lock_timeout",
            Self::Db(_) => "store_fault",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for OutlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NodeNotFound(id) => write!(f, "outline node not found: {id}"),
            Self::ItemNotFound(id) => write!(f, "attached item not found: {id}"),
            Self::InvalidParent(id) => write!(f, "parent node not found in scope: {id}"),
            Self::MovementNotAllowed { target, movement } => {
                write!(f, "movement not allowed: {movement} for {target}")
            }
            Self::LockTimeout => write!(f, "timed out waiting for the outline write lock"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "outline repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "outline repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "outline repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid outline data: {message}"),
        }
    }
}

impl Error for OutlineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for OutlineError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for OutlineError {
    fn from(value: DbError) -> Self {
        if value.is_lock_contention() {
            return Self::LockTimeout;
        }
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for OutlineError {
    fn from(value: rusqlite::Error) -> Self {
        DbError::Sqlite(value).into()
    }
}

impl From<ShapeError> for OutlineError {
    fn from(value: ShapeError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

impl From<serde_json::Error> for OutlineError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(format!("payload serialization failed: {value}"))
    }
}
