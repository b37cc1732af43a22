/*
 * Defines the data carried between the collaborator service and the client logic.
 * The first half holds the client-side domain types (datasets, query outcomes, session
 * state); the second half holds the wire payloads exactly as the service sends or
 * expects them. Domain types never embed wire types, so the wire shapes can drift
 * without touching the state holders.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

// Number of datasets a session may hold when the service does not report its own limit.
pub const DEFAULT_DATASET_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggingIn,
    LoggedIn,
}

/*
 * A registered tabular data source. The `id` is opaque and assigned by the service;
 * `name` is the original file name and is only used for display.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
}

impl Dataset {
    pub fn new(id: &str, name: &str) -> Self {
        Dataset {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/*
 * A single nullable cell value. Variant order matters for untagged deserialization:
 * integers must be tried before floats so that `1` stays an integer.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Integer(i) => write!(f, "{i}"),
            ScalarValue::Float(x) => write!(f, "{x}"),
            ScalarValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub total_columns: usize,
    pub available_columns: Vec<String>,
}

/*
 * The outcome of one natural-language query. `Success` keeps the service's answer
 * verbatim: the translated query text, the column names and the rows, in order.
 * Every row has exactly `columns.len()` cells; payloads violating this never become
 * a `Success`.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Success {
        query_text: String,
        columns: Vec<String>,
        rows: Vec<Vec<ScalarValue>>,
        question: Option<String>,
        total_row_count: Option<usize>,
        table_info: Option<TableInfo>,
    },
    Failure {
        message: String,
    },
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

// Schema and a small sample of a registered dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetails {
    #[serde(rename = "db_id")]
    pub id: String,
    pub name: String,
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub sample_data: Vec<Vec<ScalarValue>>,
    pub row_count: u64,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

// --- Wire payloads ---

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserStatusResponse {
    pub logged_in: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub csv_count: Option<u32>,
    #[serde(default)]
    pub csv_limit: Option<u32>,
}

// Success body of upload, delete and login calls. Only the human-readable part is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub data: Option<Vec<Vec<ScalarValue>>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub row_count: Option<usize>,
    #[serde(default)]
    pub table_info: Option<TableInfo>,
}

impl QueryResponse {
    /*
     * Converts a successful response body into a `QueryResult::Success`.
     * Returns `None` if the body carries no columns, or if any row's width differs
     * from the column count; callers treat both as a failed query.
     */
    pub fn into_success(self) -> Option<QueryResult> {
        let columns = self.columns?;
        let rows = self.data.unwrap_or_default();
        if let Some(bad_row) = rows.iter().position(|row| row.len() != columns.len()) {
            log::warn!(
                "QueryResponse: Row {bad_row} has {} cells but {} columns were reported.",
                rows[bad_row].len(),
                columns.len()
            );
            return None;
        }
        Some(QueryResult::Success {
            query_text: self.query.unwrap_or_default(),
            columns,
            rows,
            question: self.question,
            total_row_count: self.row_count,
            table_info: self.table_info,
        })
    }
}
