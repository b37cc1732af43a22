/*
 * Tracks which categories of request are currently in flight. The front end disables
 * an action while its category is pending, and the client logic refuses a second
 * user-initiated request of the same category. Categories are independent: an upload
 * may run while a query is pending.
 */
use super::client_error::ClientError;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Login,
    Refresh,
    Upload,
    Query,
    Delete,
    Details,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Login => "login",
            OperationKind::Refresh => "dataset refresh",
            OperationKind::Upload => "upload",
            OperationKind::Query => "query",
            OperationKind::Delete => "delete",
            OperationKind::Details => "dataset details",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingOperations {
    active: BTreeSet<OperationKind>,
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.active.contains(&kind)
    }

    // Refuses if `kind` is already in flight. Does not mark it; see `mark`.
    pub fn ensure_idle(&self, kind: OperationKind) -> Result<(), ClientError> {
        if self.is_pending(kind) {
            return Err(ClientError::OperationInProgress(kind));
        }
        Ok(())
    }

    pub fn mark(&mut self, kind: OperationKind) {
        self.active.insert(kind);
    }

    pub fn finish(&mut self, kind: OperationKind) {
        self.active.remove(&kind);
    }

    pub fn clear_all(&mut self) {
        self.active.clear();
    }

    pub fn active(&self) -> Vec<OperationKind> {
        self.active.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_independent() {
        // Arrange
        let mut pending = PendingOperations::new();

        // Act
        pending.mark(OperationKind::Query);

        // Assert
        assert!(pending.is_pending(OperationKind::Query));
        assert!(pending.ensure_idle(OperationKind::Upload).is_ok());
        assert_eq!(
            pending.ensure_idle(OperationKind::Query),
            Err(ClientError::OperationInProgress(OperationKind::Query))
        );
    }

    #[test]
    fn test_finish_and_clear_all() {
        let mut pending = PendingOperations::new();
        pending.mark(OperationKind::Login);
        pending.mark(OperationKind::Refresh);

        pending.finish(OperationKind::Login);
        assert_eq!(pending.active(), vec![OperationKind::Refresh]);

        pending.clear_all();
        assert!(pending.is_empty());
    }
}
