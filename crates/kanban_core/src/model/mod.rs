//! Board domain model and action vocabulary.
//!
//! # Responsibility
//! - Define the snapshot shape shared by the store, persistence and callers.
//! - Define the closed action vocabulary callers dispatch.
//!
//! # Invariants
//! - Every entity is identified by a random v4 UUID that never changes.
//! - Snapshots are values: callers read them, only transitions produce them.

pub mod action;
pub mod board;
