/*
 * Holds the lifecycle of the current natural-language query. At most one query is
 * outstanding. While it is pending, the previous result stays visible; it is
 * replaced only when the new query resolves.
 */
use crate::core::QueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPhase {
    #[default]
    Idle,
    Pending,
    Resolved,
    Failed,
}

#[derive(Debug, Default)]
pub struct QueryOrchestrator {
    phase: QueryPhase,
    result: Option<QueryResult>,
    pending_dataset_id: Option<String>,
}

impl QueryOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }

    pub fn pending_dataset_id(&self) -> Option<&str> {
        self.pending_dataset_id.as_deref()
    }

    pub fn begin(&mut self, dataset_id: &str) {
        self.phase = QueryPhase::Pending;
        self.pending_dataset_id = Some(dataset_id.to_string());
    }

    pub fn resolve(&mut self, result: QueryResult) {
        self.phase = if result.is_success() {
            QueryPhase::Resolved
        } else {
            QueryPhase::Failed
        };
        self.result = Some(result);
        self.pending_dataset_id = None;
    }

    pub fn clear(&mut self) {
        self.phase = QueryPhase::Idle;
        self.result = None;
        self.pending_dataset_id = None;
    }
}
