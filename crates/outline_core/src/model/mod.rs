//! Domain models for outline nodes, attached items and scopes.

pub mod item;
pub mod node;
pub mod scope;
