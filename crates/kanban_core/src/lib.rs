//! Core state layer for the local task board.
//! This crate is the single source of truth for board invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogLevel,
    LoggingError, LoggingStatus,
};
pub use model::action::{Action, TaskFields, TaskPatch};
pub use model::board::{
    AppState, Board, BoardId, Column, ColumnId, StateValidationError, Task, TaskId,
};
pub use repo::kv_repo::{KeyValueRepository, RepoError, RepoResult, SqliteKeyValueRepository};
pub use service::board_store::{BoardStore, DispatchError, SubscriptionId};
pub use service::persistence::{clear_state, load_state, save_state, STATE_STORAGE_KEY};
pub use service::transition::{transition, TransitionError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
