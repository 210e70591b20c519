//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the string-keyed storage contract persistence writes through.
//! - Isolate SQLite query details from the store and persistence services.
//!
//! # Invariants
//! - Repository APIs report storage faults as `RepoError`; deciding whether
//!   a fault matters is left to callers.

pub mod kv_repo;
