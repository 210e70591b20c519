//! Board store: the single mutation entry point for application state.
//!
//! # Responsibility
//! - Own the current snapshot and the repository it is persisted to.
//! - Apply dispatched actions through `transition` in call order.
//! - Notify subscribers, then persist, after every accepted change.
//! - Reset to the default state on request, discarding what is stored.
//!
//! # Invariants
//! - Snapshots handed out are immutable; a dispatch swaps in a new one.
//! - Rejected and unknown actions leave the snapshot, subscribers and
//!   storage untouched.
//! - Persistence failures never reach the dispatcher.

use crate::model::action::Action;
use crate::model::board::AppState;
use crate::repo::kv_repo::KeyValueRepository;
use crate::service::persistence::{clear_state, load_state, save_state};
use crate::service::transition::{transition, TransitionError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Handle returned by `BoardStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Arc<AppState>)>;

/// Errors from `BoardStore::dispatch_json`.
#[derive(Debug)]
pub enum DispatchError {
    /// Raw payload is not a well-formed action.
    Decode(serde_json::Error),
    /// Action was decoded but rejected.
    Rejected(TransitionError),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "malformed action: {err}"),
            Self::Rejected(err) => write!(f, "action rejected: {err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::Rejected(err) => Some(err),
        }
    }
}

impl From<TransitionError> for DispatchError {
    fn from(value: TransitionError) -> Self {
        Self::Rejected(value)
    }
}

/// State holder owned by the presentation boundary.
pub struct BoardStore<R: KeyValueRepository> {
    repo: R,
    current: Arc<AppState>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<R: KeyValueRepository> BoardStore<R> {
    /// Creates a store from an explicit initial state.
    ///
    /// Nothing is written until the first accepted dispatch.
    pub fn new(initial: AppState, repo: R) -> Self {
        Self {
            repo,
            current: Arc::new(initial),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Creates a store from persisted state, or the default state when
    /// nothing usable is stored.
    pub fn open(repo: R) -> Self {
        let initial = match load_state(&repo) {
            Some(state) => {
                info!(
                    "event=store_open module=store status=ok source=storage boards={}",
                    state.boards.len()
                );
                state
            }
            None => {
                info!("event=store_open module=store status=ok source=default boards=1");
                AppState::default_state()
            }
        };
        Self::new(initial, repo)
    }

    /// Current snapshot. Stays valid after later dispatches.
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.current)
    }

    /// Borrowed view of the current snapshot.
    pub fn state(&self) -> &AppState {
        &self.current
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Drops the stored snapshot and starts over from the default state.
    ///
    /// Subscribers are notified. The fresh state is not written back, so the
    /// next `open` also starts from the default until something is
    /// dispatched.
    pub fn reset(&mut self) {
        let cleared = clear_state(&self.repo);
        self.current = Arc::new(AppState::default_state());
        info!("event=store_reset module=store status=ok storage_cleared={cleared}");
        self.notify();
    }

    /// Applies one action.
    ///
    /// # Errors
    /// Returns the `TransitionError` of a rejected action; the snapshot is
    /// unchanged in that case.
    pub fn dispatch(&mut self, action: Action) -> Result<(), TransitionError> {
        let kind = action.kind();
        if action.is_unknown() {
            debug!("event=store_dispatch module=store status=ignored action={kind}");
            return Ok(());
        }

        let next = match transition(&self.current, action) {
            Ok(next) => next,
            Err(err) => {
                warn!("event=store_dispatch module=store status=rejected action={kind} error={err}");
                return Err(err);
            }
        };

        self.current = Arc::new(next);
        info!("event=store_dispatch module=store status=ok action={kind}");

        self.notify();
        save_state(&self.repo, &self.current);
        Ok(())
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.current);
        }
    }

    /// Decodes a JSON action and applies it.
    ///
    /// Unknown `type` tags are accepted and change nothing.
    ///
    /// # Errors
    /// - `DispatchError::Decode` when the payload is not a valid action.
    /// - `DispatchError::Rejected` when the action is rejected.
    pub fn dispatch_json(&mut self, raw: &str) -> Result<(), DispatchError> {
        let action = serde_json::from_str::<Action>(raw).map_err(|err| {
            warn!("event=store_dispatch module=store status=error error_code=decode_failed error={err}");
            DispatchError::Decode(err)
        })?;
        self.dispatch(action)?;
        Ok(())
    }

    /// Registers a listener called with every new snapshot.
    pub fn subscribe(&mut self, listener: impl FnMut(&Arc<AppState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::BoardStore;
    use crate::db::open_db_in_memory;
    use crate::model::action::{Action, TaskFields};
    use crate::model::board::{AppState, BoardId};
    use crate::repo::kv_repo::SqliteKeyValueRepository;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn subscribers_see_accepted_changes_only() {
        let conn = open_db_in_memory().unwrap();
        let mut store = BoardStore::new(
            AppState::default_state(),
            SqliteKeyValueRepository::new(&conn),
        );
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let id = store.subscribe(move |_| seen.set(seen.get() + 1));

        let board_id = store.state().boards[0].id.clone();
        let column_id = store.state().boards[0].columns[0].id.clone();
        store
            .dispatch(Action::AddTask {
                board_id,
                column_id,
                task: TaskFields::titled("X"),
            })
            .unwrap();
        store.dispatch(Action::Unknown).unwrap();
        store
            .dispatch(Action::RenameBoard {
                board_id: BoardId::from("gone"),
                name: "Renamed".to_string(),
            })
            .unwrap_err();
        assert_eq!(calls.get(), 1);

        assert!(store.unsubscribe(id));
        store
            .dispatch(Action::CreateBoard {
                name: "Work".to_string(),
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn earlier_snapshot_is_unaffected_by_dispatch() {
        let conn = open_db_in_memory().unwrap();
        let mut store = BoardStore::new(
            AppState::default_state(),
            SqliteKeyValueRepository::new(&conn),
        );
        let before = store.snapshot();
        let frozen = (*before).clone();

        store
            .dispatch(Action::CreateBoard {
                name: "Work".to_string(),
            })
            .unwrap();
        assert_eq!(*before, frozen);
        assert_eq!(store.state().boards.len(), 2);
    }

    #[test]
    fn reset_notifies_subscribers_with_default_state() {
        let conn = open_db_in_memory().unwrap();
        let mut store = BoardStore::new(
            AppState::default_state(),
            SqliteKeyValueRepository::new(&conn),
        );
        store
            .dispatch(Action::CreateBoard {
                name: "Work".to_string(),
            })
            .unwrap();

        let boards_seen = Rc::new(Cell::new(0));
        let seen = Rc::clone(&boards_seen);
        store.subscribe(move |state| seen.set(state.boards.len()));

        store.reset();
        assert_eq!(boards_seen.get(), 1);
        assert_eq!(store.state().boards[0].name, "Personal");
    }
}
