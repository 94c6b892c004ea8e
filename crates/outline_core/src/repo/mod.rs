//! Repository layer: SQLite persistence for outlines, items and expansion state.
//!
//! # Responsibility
//! - Define storage contracts consumed by services.
//! - Keep SQL and key reassignment details inside the repository boundary.
//!
//! # Invariants
//! - Repositories are constructed only over migrated connections (`try_new`).
//! - Every structural write runs under one [`position_index::WriteLock`].
//! - Repository APIs return semantic errors (`NodeNotFound`,
//!   `MovementNotAllowed`, ...) in addition to store faults.

pub mod error;
pub mod expansion_repo;
pub mod item_repo;
pub mod outline_repo;
pub mod position_index;
mod schema;
