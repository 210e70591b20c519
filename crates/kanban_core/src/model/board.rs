//! Board/column/task domain model.
//!
//! # Responsibility
//! - Define the canonical records that make up one application snapshot.
//! - Provide constructors for new boards, the default board and default state.
//! - Check snapshot-wide invariants for load and test paths.
//!
//! # Invariants
//! - Board ids are unique across boards; column and task ids are unique
//!   within their board.
//! - Columns store task ids only; task data lives in `Board::tasks`.
//! - A task id is referenced by at most one column of its board.
//! - `boards` is never empty.
//! - `created_at` is set once at construction.
//! - Names, titles and ids are stored exactly as given.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Standard columns every new board starts with.
pub const DEFAULT_COLUMN_TITLES: [&str; 3] = ["To Do", "In Progress", "Done"];
/// Name used by `CreateBoard` when the requested name is blank.
pub const UNTITLED_BOARD_NAME: &str = "Untitled";
/// Name of the fallback board.
pub const DEFAULT_BOARD_NAME: &str = "Personal";
/// Title of the task seeded into the fallback board.
pub const WELCOME_TASK_TITLE: &str = "Welcome to your Kanban";
const WELCOME_TASK_DESCRIPTION: &str = "Drag me around, edit, or delete.";
const WELCOME_TASK_TAG: &str = "intro";

/// Defines an opaque string identifier.
///
/// Any string is accepted on load; freshly generated ids are v4 UUIDs.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh identifier.
            pub fn generate() -> Self {
                Self(new_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Board identifier, unique across boards.
    BoardId
);
string_id!(
    /// Column identifier, unique within its board.
    ColumnId
);
string_id!(
    /// Task identifier, unique within its board.
    TaskId
);

/// Generates a fresh 128-bit random identifier in hyphenated form.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Removes duplicate tags keeping first occurrence. Values are kept as given.
pub fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// One unit of work owned by a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Set-like: no duplicates, insertion order kept.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Creates a task with a generated id.
    pub fn new(title: String, description: String, tags: Vec<String>) -> Self {
        Self {
            id: TaskId::generate(),
            title,
            description,
            tags,
            created_at: now_epoch_ms(),
        }
    }
}

/// Named, ordered lane of task references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub task_ids: Vec<TaskId>,
}

impl Column {
    /// Creates an empty column with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ColumnId::generate(),
            title: title.into(),
            task_ids: Vec::new(),
        }
    }
}

/// Top-level container of columns and tasks.
///
/// Tasks are held behind `Arc` so cloning a board for a single edit copies
/// pointers, not task bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub columns: Vec<Column>,
    pub tasks: BTreeMap<TaskId, Arc<Task>>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Board {
    /// Creates a board seeded with the standard three empty columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BoardId::generate(),
            name: name.into(),
            columns: DEFAULT_COLUMN_TITLES
                .iter()
                .map(|title| Column::new(*title))
                .collect(),
            tasks: BTreeMap::new(),
            created_at: now_epoch_ms(),
        }
    }

    /// Creates the fallback board used on first start and after the last
    /// board is deleted.
    pub fn default_board() -> Self {
        let mut board = Self::new(DEFAULT_BOARD_NAME);
        let welcome = Task::new(
            WELCOME_TASK_TITLE.to_string(),
            WELCOME_TASK_DESCRIPTION.to_string(),
            vec![WELCOME_TASK_TAG.to_string()],
        );
        board.columns[0].task_ids.push(welcome.id.clone());
        board.tasks.insert(welcome.id.clone(), Arc::new(welcome));
        board
    }

    pub fn column(&self, column_id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|column| &column.id == column_id)
    }

    /// Finds a column by its current title. First match wins.
    pub fn column_by_title(&self, title: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.title == title)
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.get(task_id).map(Arc::as_ref)
    }

    /// Resolves a column's task ids into task records, in column order.
    pub fn column_tasks(&self, column_id: &ColumnId) -> Option<Vec<&Task>> {
        let column = self.column(column_id)?;
        Some(
            column
                .task_ids
                .iter()
                .filter_map(|task_id| self.task(task_id))
                .collect(),
        )
    }

    /// Task ids present in `tasks` but referenced by no column.
    pub fn unassigned_task_ids(&self) -> Vec<TaskId> {
        let referenced: HashSet<&TaskId> = self
            .columns
            .iter()
            .flat_map(|column| column.task_ids.iter())
            .collect();
        self.tasks
            .keys()
            .filter(|task_id| !referenced.contains(task_id))
            .cloned()
            .collect()
    }

    pub(crate) fn column_index(&self, column_id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| &column.id == column_id)
    }
}

/// Root aggregate and unit of persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub boards: Vec<Arc<Board>>,
}

impl AppState {
    /// One default board with its welcome task.
    pub fn default_state() -> Self {
        Self {
            boards: vec![Arc::new(Board::default_board())],
        }
    }

    pub fn board(&self, board_id: &BoardId) -> Option<&Board> {
        self.boards
            .iter()
            .find(|board| &board.id == board_id)
            .map(Arc::as_ref)
    }

    /// Checks every snapshot invariant.
    ///
    /// # Errors
    /// Returns the first violation found, scanning boards in order.
    pub fn validate(&self) -> Result<(), StateValidationError> {
        if self.boards.is_empty() {
            return Err(StateValidationError::NoBoards);
        }

        let mut board_ids = HashSet::new();
        for board in &self.boards {
            if !board_ids.insert(&board.id) {
                return Err(StateValidationError::DuplicateBoardId(board.id.clone()));
            }
            validate_board(board)?;
        }
        Ok(())
    }
}

fn validate_board(board: &Board) -> Result<(), StateValidationError> {
    for (key, task) in &board.tasks {
        if *key != task.id {
            return Err(StateValidationError::TaskKeyMismatch {
                board_id: board.id.clone(),
                key: key.clone(),
                task_id: task.id.clone(),
            });
        }
    }

    let mut column_ids = HashSet::new();
    let mut referenced = HashSet::new();
    for column in &board.columns {
        if !column_ids.insert(&column.id) {
            return Err(StateValidationError::DuplicateColumnId {
                board_id: board.id.clone(),
                column_id: column.id.clone(),
            });
        }
        for task_id in &column.task_ids {
            if !board.tasks.contains_key(task_id) {
                return Err(StateValidationError::DanglingTaskRef {
                    board_id: board.id.clone(),
                    column_id: column.id.clone(),
                    task_id: task_id.clone(),
                });
            }
            if !referenced.insert(task_id) {
                return Err(StateValidationError::DuplicateTaskRef {
                    board_id: board.id.clone(),
                    task_id: task_id.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Snapshot invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValidationError {
    NoBoards,
    DuplicateBoardId(BoardId),
    DuplicateColumnId {
        board_id: BoardId,
        column_id: ColumnId,
    },
    TaskKeyMismatch {
        board_id: BoardId,
        key: TaskId,
        task_id: TaskId,
    },
    DanglingTaskRef {
        board_id: BoardId,
        column_id: ColumnId,
        task_id: TaskId,
    },
    /// Same task id listed twice, in one column or across columns.
    DuplicateTaskRef { board_id: BoardId, task_id: TaskId },
}

impl Display for StateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBoards => write!(f, "state must contain at least one board"),
            Self::DuplicateBoardId(id) => write!(f, "duplicate board id: {id}"),
            Self::DuplicateColumnId {
                board_id,
                column_id,
            } => write!(f, "duplicate column id {column_id} in board {board_id}"),
            Self::TaskKeyMismatch {
                board_id,
                key,
                task_id,
            } => write!(
                f,
                "task map key {key} does not match task id {task_id} in board {board_id}"
            ),
            Self::DanglingTaskRef {
                board_id,
                column_id,
                task_id,
            } => write!(
                f,
                "column {column_id} in board {board_id} references missing task {task_id}"
            ),
            Self::DuplicateTaskRef { board_id, task_id } => write!(
                f,
                "task {task_id} is referenced more than once in board {board_id}"
            ),
        }
    }
}

impl Error for StateValidationError {}
