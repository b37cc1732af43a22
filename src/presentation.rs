/*
 * Text rendering and command parsing for the interactive front end. Everything here is
 * a pure function of its input so the front end in `main.rs` stays a thin loop.
 */
use crate::app_logic::{ClientSnapshot, OperationKind, QueryPhase};
use crate::core::{DatasetDetails, QueryResult, ScalarValue, SessionState};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Login(String),
    Logout,
    List,
    ChooseFile(PathBuf),
    Upload(Option<PathBuf>),
    Select(String),
    Ask(String),
    Delete(Option<String>),
    Info(Option<String>),
    Status,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  login <name>       log in (no password)
  logout             end the session
  list               reload the dataset list
  file <path>        choose a CSV file for upload
  upload [path]      upload the chosen file, or <path>
  select <id>        choose the dataset to query
  ask <question>     ask a question about the selected dataset
  delete [id]        delete a dataset (default: selected)
  info [id]          show columns and sample rows (default: selected)
  status             show the current state
  help               show this text
  quit               exit";

/*
 * Parses one input line. Returns `Ok(None)` for blank lines and `Err` with a
 * user-facing message for unknown commands or missing arguments.
 */
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());
    let required = |s: &str, what: &str| {
        if s.is_empty() {
            Err(format!("Usage: {verb} <{what}>"))
        } else {
            Ok(s.to_string())
        }
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "login" => ReplCommand::Login(required(rest, "name")?),
        "logout" => ReplCommand::Logout,
        "list" | "ls" => ReplCommand::List,
        "file" => ReplCommand::ChooseFile(PathBuf::from(required(rest, "path")?)),
        "upload" => ReplCommand::Upload(optional(rest).map(PathBuf::from)),
        "select" | "use" => ReplCommand::Select(required(rest, "id")?),
        "ask" | "query" => ReplCommand::Ask(required(rest, "question")?),
        "delete" | "rm" => ReplCommand::Delete(optional(rest)),
        "info" => ReplCommand::Info(optional(rest)),
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(format!("Unknown command '{other}'. Type 'help' for a list.")),
    };
    Ok(Some(command))
}

fn render_table(columns: &[String], rows: &[Vec<ScalarValue>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", format_line(columns));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", separator.join("-+-"));
    for row in &cells {
        let _ = writeln!(out, "{}", format_line(row));
    }
    out
}

pub fn render_query_result(result: &QueryResult) -> String {
    match result {
        QueryResult::Success {
            query_text,
            columns,
            rows,
            total_row_count,
            ..
        } => {
            let mut out = String::new();
            let _ = writeln!(out, "SQL: {query_text}");
            if columns.is_empty() {
                out.push_str("(no columns)\n");
                return out;
            }
            out.push_str(&render_table(columns, rows));
            let count = total_row_count.unwrap_or(rows.len());
            let noun = if count == 1 { "row" } else { "rows" };
            let _ = writeln!(out, "({count} {noun})");
            out
        }
        QueryResult::Failure { message } => format!("Query failed: {message}\n"),
    }
}

pub fn render_dataset_details(details: &DatasetDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (table '{}', {} rows)",
        details.name, details.table_name, details.row_count
    );
    if let Some(uploaded_at) = &details.uploaded_at {
        let _ = writeln!(out, "Uploaded: {uploaded_at}");
    }
    for column in &details.columns {
        let _ = writeln!(out, "  {} {}", column.name, column.data_type);
    }
    if !details.sample_data.is_empty() {
        let names: Vec<String> = details.columns.iter().map(|c| c.name.clone()).collect();
        out.push_str("Sample:\n");
        out.push_str(&render_table(&names, &details.sample_data));
    }
    out
}

pub fn render_snapshot_summary(snapshot: &ClientSnapshot) -> String {
    let mut out = String::new();
    match snapshot.session_state {
        SessionState::LoggedOut => out.push_str("Not logged in.\n"),
        SessionState::LoggingIn => {
            let _ = writeln!(out, "Logging in as {}...", snapshot.username);
        }
        SessionState::LoggedIn => {
            let _ = writeln!(out, "Logged in as {}.", snapshot.username);
        }
    }

    if snapshot.is_logged_in() {
        let _ = writeln!(
            out,
            "Datasets ({}/{}):",
            snapshot.datasets.len(),
            snapshot.dataset_limit
        );
        if snapshot.datasets.is_empty() {
            out.push_str("  (none)\n");
        }
        for dataset in &snapshot.datasets {
            let marker = if snapshot.selected_dataset_id.as_deref() == Some(dataset.id.as_str()) {
                '*'
            } else {
                ' '
            };
            let _ = writeln!(out, " {marker} [{}] {}", dataset.id, dataset.name);
        }
        if let Some(file) = &snapshot.chosen_upload_file {
            let _ = writeln!(out, "Upload file: {}", file.display());
        }
    }

    let pending: Vec<String> = snapshot
        .pending
        .active()
        .iter()
        .map(OperationKind::to_string)
        .collect();
    if !pending.is_empty() {
        let _ = writeln!(out, "Waiting for: {}", pending.join(", "));
    }
    if snapshot.query_phase == QueryPhase::Pending {
        out.push_str("Query running...\n");
    }
    if let Some(notice) = &snapshot.notice {
        let _ = writeln!(out, "{notice}");
    }
    if let Some(error) = &snapshot.error_message {
        let _ = writeln!(out, "Error: {error}");
    }
    out
}
