/*
 * Errors returned synchronously by client logic operations. These are local refusals:
 * no request was sent. Failures of requests that were sent are reported through the
 * observable state (error message, query result, session reset) instead.
 */
use super::pending_operations::OperationKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    Validation(String),
    NotLoggedIn,
    AlreadyLoggedIn,
    OperationInProgress(OperationKind),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Validation(message) => write!(f, "{message}"),
            ClientError::NotLoggedIn => write!(f, "Not logged in"),
            ClientError::AlreadyLoggedIn => write!(f, "Already logged in"),
            ClientError::OperationInProgress(kind) => {
                write!(f, "A {kind} request is already in progress")
            }
        }
    }
}

impl std::error::Error for ClientError {}

pub type Result<T> = std::result::Result<T, ClientError>;
