//! CLI entry point for the local task board.
//!
//! # Responsibility
//! - Dispatch JSON actions given as arguments against the configured store.
//! - Optionally discard stored boards first (`--reset`).
//! - Print a deterministic one-line-per-board summary of the result.
//!
//! Usage: `kanban_cli [--reset] ['{"type":"CREATE_BOARD","name":"Work"}' ...]`

use kanban_core::db::open_db;
use kanban_core::{
    init_logging_from_config, AppState, BoardStore, CoreConfig, SqliteKeyValueRepository,
};
use log::error;
use std::process::ExitCode;

const RESET_FLAG: &str = "--reset";

fn main() -> ExitCode {
    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("kanban_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(mut args: Vec<String>) -> Result<(), String> {
    let reset = args.first().is_some_and(|arg| arg == RESET_FLAG);
    let raw_actions = if reset { args.split_off(1) } else { args };

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let conn = open_db(&config.db_path).map_err(|err| {
        error!(
            "event=cli_open module=cli status=error error_code={}",
            err.error_code()
        );
        err.to_string()
    })?;
    let repo = SqliteKeyValueRepository::with_quota(&conn, config.storage_quota_bytes);
    let mut store = BoardStore::open(repo);
    if reset {
        store.reset();
    }

    for (index, raw) in raw_actions.iter().enumerate() {
        store
            .dispatch_json(raw)
            .map_err(|err| format!("action #{}: {err}", index + 1))?;
    }

    print_summary(store.state());
    Ok(())
}

fn print_summary(state: &AppState) {
    println!("kanban_core version={}", kanban_core::core_version());
    for board in &state.boards {
        println!(
            "board id={} name={:?} columns={} tasks={}",
            board.id,
            board.name,
            board.columns.len(),
            board.tasks.len()
        );
        for column in &board.columns {
            println!(
                "  column id={} title={:?} tasks={}",
                column.id,
                column.title,
                column.task_ids.len()
            );
        }
    }
}
