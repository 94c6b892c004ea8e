//! Use-case services over the repository layer.
//!
//! # Responsibility
//! - Validate input and structural preconditions before locking.
//! - Log one metadata-only event per write command.

pub mod expansion_service;
pub mod item_service;
pub mod outline_service;
