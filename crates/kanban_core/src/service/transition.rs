//! Pure state transition function.
//!
//! # Responsibility
//! - Map `(snapshot, action)` to the next snapshot.
//! - Reject actions that name missing boards, columns or tasks.
//!
//! # Invariants
//! - The input snapshot is never mutated; only the edited board (and task)
//!   is copied, everything else is shared with the input.
//! - A successful result satisfies `AppState::validate()` whenever the input
//!   did.
//! - A rejected action produces no state at all.
//! - `Action::Unknown` yields a state equal to the input.
//! - Names and titles are stored verbatim. Only `CreateBoard` substitutes a
//!   placeholder, and only for a blank name.

use crate::model::action::{Action, TaskFields, TaskPatch};
use crate::model::board::{
    dedupe_tags, AppState, Board, BoardId, Column, ColumnId, Task, TaskId, UNTITLED_BOARD_NAME,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Reasons an action is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    BoardNotFound(BoardId),
    ColumnNotFound {
        board_id: BoardId,
        column_id: ColumnId,
    },
    TaskNotFound {
        board_id: BoardId,
        task_id: TaskId,
    },
    /// `from_index` of a move does not address a task in the source column.
    IndexOutOfRange {
        column_id: ColumnId,
        index: usize,
        len: usize,
    },
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ColumnNotFound {
                board_id,
                column_id,
            } => write!(f, "column {column_id} not found in board {board_id}"),
            Self::TaskNotFound { board_id, task_id } => {
                write!(f, "task {task_id} not found in board {board_id}")
            }
            Self::IndexOutOfRange {
                column_id,
                index,
                len,
            } => write!(
                f,
                "index {index} out of range for column {column_id} with {len} tasks"
            ),
        }
    }
}

impl Error for TransitionError {}

/// Computes the snapshot that follows `state` once `action` is applied.
///
/// # Errors
/// Returns a `TransitionError` when the action names an entity that does not
/// exist or a move index is out of range.
pub fn transition(state: &AppState, action: Action) -> Result<AppState, TransitionError> {
    let mut next = state.clone();

    match action {
        Action::CreateBoard { name } => {
            let name = if name.trim().is_empty() {
                UNTITLED_BOARD_NAME.to_string()
            } else {
                name
            };
            next.boards.push(Arc::new(Board::new(name)));
        }
        Action::RenameBoard { board_id, name } => {
            board_mut(&mut next, &board_id)?.name = name;
        }
        Action::DeleteBoard { board_id } => {
            let position = next
                .boards
                .iter()
                .position(|board| board.id == board_id)
                .ok_or(TransitionError::BoardNotFound(board_id))?;
            next.boards.remove(position);
            if next.boards.is_empty() {
                next.boards.push(Arc::new(Board::default_board()));
            }
        }
        Action::AddColumn { board_id, title } => {
            board_mut(&mut next, &board_id)?
                .columns
                .push(Column::new(title));
        }
        Action::RenameColumn {
            board_id,
            column_id,
            title,
        } => {
            let board = board_mut(&mut next, &board_id)?;
            let index = column_index(board, &column_id)?;
            board.columns[index].title = title;
        }
        Action::DeleteColumn {
            board_id,
            column_id,
        } => {
            let board = board_mut(&mut next, &board_id)?;
            let index = column_index(board, &column_id)?;
            let removed = board.columns.remove(index);
            // Tasks go with their column so none is left unreachable.
            for task_id in &removed.task_ids {
                board.tasks.remove(task_id);
            }
        }
        Action::AddTask {
            board_id,
            column_id,
            task,
        } => {
            let board = board_mut(&mut next, &board_id)?;
            let index = column_index(board, &column_id)?;
            let task = build_task(task);
            board.columns[index].task_ids.insert(0, task.id.clone());
            board.tasks.insert(task.id.clone(), Arc::new(task));
        }
        Action::EditTask {
            board_id,
            task_id,
            patch,
        } => {
            let board = board_mut(&mut next, &board_id)?;
            let task = board
                .tasks
                .get_mut(&task_id)
                .ok_or(TransitionError::TaskNotFound { board_id, task_id })?;
            apply_patch(Arc::make_mut(task), patch);
        }
        Action::DeleteTask {
            board_id,
            column_id,
            task_id,
        } => {
            let board = board_mut(&mut next, &board_id)?;
            column_index(board, &column_id)?;
            if board.tasks.remove(&task_id).is_none() {
                return Err(TransitionError::TaskNotFound { board_id, task_id });
            }
            for column in &mut board.columns {
                column.task_ids.retain(|id| *id != task_id);
            }
        }
        Action::MoveTask {
            board_id,
            from_column_id,
            to_column_id,
            from_index,
            to_index,
        } => {
            let board = board_mut(&mut next, &board_id)?;
            let from = column_index(board, &from_column_id)?;
            let to = column_index(board, &to_column_id)?;

            let source = &mut board.columns[from].task_ids;
            if from_index >= source.len() {
                return Err(TransitionError::IndexOutOfRange {
                    column_id: from_column_id,
                    index: from_index,
                    len: source.len(),
                });
            }
            let task_id = source.remove(from_index);

            let destination = &mut board.columns[to].task_ids;
            let at = to_index.min(destination.len());
            destination.insert(at, task_id);
        }
        Action::Unknown => {}
    }

    Ok(next)
}

/// Copy-on-write access to one board of `state`.
fn board_mut<'s>(
    state: &'s mut AppState,
    board_id: &BoardId,
) -> Result<&'s mut Board, TransitionError> {
    state
        .boards
        .iter_mut()
        .find(|board| &board.id == board_id)
        .map(Arc::make_mut)
        .ok_or_else(|| TransitionError::BoardNotFound(board_id.clone()))
}

fn column_index(board: &Board, column_id: &ColumnId) -> Result<usize, TransitionError> {
    board
        .column_index(column_id)
        .ok_or_else(|| TransitionError::ColumnNotFound {
            board_id: board.id.clone(),
            column_id: column_id.clone(),
        })
}

fn build_task(fields: TaskFields) -> Task {
    Task::new(fields.title, fields.description, dedupe_tags(fields.tags))
}

fn apply_patch(task: &mut Task, patch: TaskPatch) {
    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(tags) = patch.tags {
        task.tags = dedupe_tags(tags);
    }
}
