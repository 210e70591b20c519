//! Snapshot persistence round-trip.
//!
//! # Responsibility
//! - Serialize the full `AppState` under one fixed key.
//! - Restore it at startup, treating anything unusable as "no prior state".
//! - Discard it on reset.
//!
//! # Invariants
//! - `load_state` never returns a state that fails `AppState::validate()`.
//! - Neither function propagates an error; failures are logged and dropped.
//! - Log events carry sizes and error text only, never board content.

use crate::model::board::AppState;
use crate::repo::kv_repo::KeyValueRepository;
use log::{debug, warn};

/// Fixed storage key of the persisted snapshot.
pub const STATE_STORAGE_KEY: &str = "kanban.local.v1";

/// Reads the persisted snapshot.
///
/// Returns `None` when no value is stored, the store cannot be read, the
/// value does not parse, or the parsed state violates a snapshot invariant.
pub fn load_state<R: KeyValueRepository>(repo: &R) -> Option<AppState> {
    let raw = match repo.get_item(STATE_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("event=state_load module=persistence status=absent");
            return None;
        }
        Err(err) => {
            warn!("event=state_load module=persistence status=error error_code=read_failed error={err}");
            return None;
        }
    };

    let state = match serde_json::from_str::<AppState>(&raw) {
        Ok(state) => state,
        Err(err) => {
            warn!(
                "event=state_load module=persistence status=error error_code=parse_failed bytes={} error={err}",
                raw.len()
            );
            return None;
        }
    };

    if let Err(err) = state.validate() {
        warn!("event=state_load module=persistence status=error error_code=invalid_state error={err}");
        return None;
    }

    debug!(
        "event=state_load module=persistence status=ok bytes={} boards={}",
        raw.len(),
        state.boards.len()
    );
    Some(state)
}

/// Writes the snapshot, best effort.
///
/// Returns whether the write went through. Callers are free to ignore it:
/// the in-memory snapshot stays authoritative either way.
pub fn save_state<R: KeyValueRepository>(repo: &R, state: &AppState) -> bool {
    let raw = match serde_json::to_string(state) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("event=state_save module=persistence status=error error_code=serialize_failed error={err}");
            return false;
        }
    };

    match repo.set_item(STATE_STORAGE_KEY, &raw) {
        Ok(()) => {
            debug!(
                "event=state_save module=persistence status=ok bytes={}",
                raw.len()
            );
            true
        }
        Err(err) => {
            warn!(
                "event=state_save module=persistence status=error error_code=write_failed bytes={} error={err}",
                raw.len()
            );
            false
        }
    }
}

/// Removes the persisted snapshot, best effort.
///
/// Returns whether storage is now free of a snapshot. A missing key counts
/// as cleared.
pub fn clear_state<R: KeyValueRepository>(repo: &R) -> bool {
    match repo.remove_item(STATE_STORAGE_KEY) {
        Ok(existed) => {
            debug!("event=state_clear module=persistence status=ok existed={existed}");
            true
        }
        Err(err) => {
            warn!("event=state_clear module=persistence status=error error_code=remove_failed error={err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{clear_state, load_state, save_state, STATE_STORAGE_KEY};
    use crate::db::open_db_in_memory;
    use crate::model::board::AppState;
    use crate::repo::kv_repo::{KeyValueRepository, SqliteKeyValueRepository};

    #[test]
    fn load_without_saved_state_is_absent() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);
        assert_eq!(load_state(&repo), None);
    }

    #[test]
    fn save_then_load_is_structurally_equal() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);
        let state = AppState::default_state();

        assert!(save_state(&repo, &state));
        assert_eq!(load_state(&repo), Some(state));
    }

    #[test]
    fn schema_violating_state_is_treated_as_absent() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);
        repo.set_item(STATE_STORAGE_KEY, r#"{"boards":[]}"#).unwrap();
        assert_eq!(load_state(&repo), None);
    }

    #[test]
    fn clear_removes_saved_state_and_tolerates_absence() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);
        assert!(save_state(&repo, &AppState::default_state()));

        assert!(clear_state(&repo));
        assert_eq!(repo.get_item(STATE_STORAGE_KEY).unwrap(), None);
        assert!(clear_state(&repo));
    }
}
