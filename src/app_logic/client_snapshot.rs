/*
 * This module defines `ClientSnapshot`, a read-only copy of everything a front end
 * needs to render the client: session, datasets, selections, the query outcome and
 * the status messages. Snapshots are taken on the interaction thread between event
 * processing steps, so they are always internally consistent.
 */
use super::pending_operations::{OperationKind, PendingOperations};
use super::query_orchestrator::QueryPhase;
use crate::core::{Dataset, DatasetDetails, QueryResult, SessionState};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSnapshot {
    pub session_state: SessionState,
    /* Empty unless the session is LoggingIn or LoggedIn. */
    pub username: String,
    pub datasets: Vec<Dataset>,
    /* Maximum number of datasets the service accepts; informational only. */
    pub dataset_limit: u32,
    pub selected_dataset_id: Option<String>,
    pub dataset_details: Option<DatasetDetails>,
    pub chosen_upload_file: Option<PathBuf>,
    pub query_phase: QueryPhase,
    pub query_result: Option<QueryResult>,
    /* The single user-visible error slot. Cleared when a new operation is attempted. */
    pub error_message: Option<String>,
    /* Success message from the last upload or delete, cleared like `error_message`. */
    pub notice: Option<String>,
    pub pending: PendingOperations,
}

impl ClientSnapshot {
    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.pending.is_pending(kind)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session_state == SessionState::LoggedIn
    }

    pub fn selected_dataset(&self) -> Option<&Dataset> {
        let id = self.selected_dataset_id.as_deref()?;
        self.datasets.iter().find(|d| d.id == id)
    }

    // Whether a query can be submitted against the current selection right now.
    pub fn can_submit_query(&self) -> bool {
        self.is_logged_in()
            && self.selected_dataset_id.is_some()
            && !self.is_pending(OperationKind::Query)
    }

    pub fn can_upload(&self) -> bool {
        self.is_logged_in() && !self.is_pending(OperationKind::Upload)
    }
}
