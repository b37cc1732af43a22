/*
 * This module provides the client logic layer, centered around `ClientLogic`, which
 * owns all client state and turns user operations into requests against the
 * collaborator service. The state itself is split into small holders: the session
 * (`SessionController`), the dataset list and selections (`DatasetRegistry`), the
 * query lifecycle (`QueryOrchestrator`) and the in-flight flags (`PendingOperations`).
 * Unit tests for `ClientLogic` are in `handler_tests.rs`.
 */
pub mod client_error;
pub mod client_snapshot;
pub mod dataset_registry;
pub mod handler;
pub mod pending_operations;
pub mod query_orchestrator;
pub mod session_controller;


pub use client_error::ClientError;
pub use client_snapshot::ClientSnapshot;
pub use handler::ClientLogic;
pub use pending_operations::{OperationKind, PendingOperations};
pub use query_orchestrator::QueryPhase;
