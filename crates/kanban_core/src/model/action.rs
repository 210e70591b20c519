//! Action vocabulary accepted by the board store.
//!
//! # Responsibility
//! - Define the closed set of state changes a collaborator can request.
//! - Define the JSON wire form used by non-Rust collaborators.
//!
//! # Invariants
//! - Unknown `type` tags decode to `Action::Unknown`, never to an error.
//! - Payloads carry ids and field values only, never state fragments.

use crate::model::board::{BoardId, ColumnId, TaskId};
use serde::{Deserialize, Serialize};

/// Field values for a task created by `Action::AddTask`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl TaskFields {
    /// Fields with a title only.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Shallow patch for `Action::EditTask`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// One requested state change.
///
/// Wire form is internally tagged: `{"type": "ADD_TASK", "boardId": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    #[serde(alias = "ADD_BOARD")]
    CreateBoard {
        #[serde(default)]
        name: String,
    },
    RenameBoard {
        board_id: BoardId,
        name: String,
    },
    DeleteBoard {
        board_id: BoardId,
    },
    AddColumn {
        board_id: BoardId,
        title: String,
    },
    RenameColumn {
        board_id: BoardId,
        column_id: ColumnId,
        title: String,
    },
    DeleteColumn {
        board_id: BoardId,
        column_id: ColumnId,
    },
    AddTask {
        board_id: BoardId,
        column_id: ColumnId,
        #[serde(default)]
        task: TaskFields,
    },
    EditTask {
        board_id: BoardId,
        task_id: TaskId,
        #[serde(default)]
        patch: TaskPatch,
    },
    DeleteTask {
        board_id: BoardId,
        column_id: ColumnId,
        task_id: TaskId,
    },
    MoveTask {
        board_id: BoardId,
        #[serde(alias = "fromColId")]
        from_column_id: ColumnId,
        #[serde(alias = "toColId")]
        to_column_id: ColumnId,
        from_index: usize,
        to_index: usize,
    },
    /// Any tag outside the vocabulary. Transitions to an identical state.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Stable wire tag, used as the `action=` field in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateBoard { .. } => "CREATE_BOARD",
            Self::RenameBoard { .. } => "RENAME_BOARD",
            Self::DeleteBoard { .. } => "DELETE_BOARD",
            Self::AddColumn { .. } => "ADD_COLUMN",
            Self::RenameColumn { .. } => "RENAME_COLUMN",
            Self::DeleteColumn { .. } => "DELETE_COLUMN",
            Self::AddTask { .. } => "ADD_TASK",
            Self::EditTask { .. } => "EDIT_TASK",
            Self::DeleteTask { .. } => "DELETE_TASK",
            Self::MoveTask { .. } => "MOVE_TASK",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}
