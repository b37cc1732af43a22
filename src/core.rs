/*
 * This module consolidates the platform-agnostic building blocks of the client: the
 * data models and wire payloads, the failure classifier, the HTTP transport
 * (`HttpTransportOperations`), the background job runner (`TaskRunnerOperations`),
 * configuration (`ConfigManagerOperations`) and directory helpers. Nothing here holds
 * session state; that lives in `app_logic`.
 */
pub mod config;
pub mod error_classifier;
pub mod models;
pub mod path_utils;
pub mod task_runner;
pub mod transport;

pub use config::{ClientConfig, ConfigError, ConfigManagerOperations, CoreConfigManager};

pub use error_classifier::{FailureClass, classify};

pub use models::{
    ColumnInfo, DEFAULT_DATASET_LIMIT, Dataset, DatasetDetails, QueryResult, ScalarValue,
    SessionState, TableInfo,
};

pub use task_runner::{Job, TaskRunnerOperations, ThreadTaskRunner};

pub use transport::{
    CoreHttpTransport, HttpTransportOperations, TransportError, TransportResponse,
};
