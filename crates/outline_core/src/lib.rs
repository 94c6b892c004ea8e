//! Ordered outline-tree store.
//!
//! Outlines are flat `(position, level)` sequences per scope; the tree is
//! implied by consecutive levels. Structural commands reassign keys under an
//! exclusive SQLite write lock so readers only ever see complete states.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use db::{open_db, open_db_in_memory, open_db_with_config, DbError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::item::{AttachedItem, ItemId, ItemIndex, ItemPayload};
pub use model::node::{
    Level, NodeFields, NodeId, OutlineNode, Position, TimeRange, ValidationError,
};
pub use model::scope::{OwnerId, Scope, TreeKind, UserId};
pub use repo::error::{OutlineError, OutlineResult};
pub use repo::expansion_repo::{ExpansionRepository, SqliteExpansionRepository};
pub use repo::item_repo::{ItemRepository, SqliteItemRepository};
pub use repo::outline_repo::{OutlineRepository, Removal, SqliteOutlineRepository};
pub use service::expansion_service::ExpansionService;
pub use service::item_service::ItemService;
pub use service::outline_service::{subtree_of, OutlineService};
pub use tree::{Movement, OutlineNumber, OutlineTree, PositionRange, ViewMode, VisibleNode};

/// Minimal health-check API for embedding hosts.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
