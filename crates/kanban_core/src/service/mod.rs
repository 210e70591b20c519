//! Core use-case services.
//!
//! # Responsibility
//! - Turn dispatched actions into new snapshots (`transition`).
//! - Own the live snapshot and its persistence (`board_store`, `persistence`).
//! - Keep callers decoupled from storage details.

pub mod board_store;
pub mod persistence;
pub mod transition;
