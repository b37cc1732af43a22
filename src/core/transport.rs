/*
 * Performs the HTTP requests the client needs against the collaborator service.
 * The `HttpTransportOperations` trait keeps the client logic independent of the HTTP
 * stack so it can be driven by mocks in tests. `CoreHttpTransport` is the concrete
 * implementation, built on a blocking `reqwest` client with a cookie store: the session
 * cookie set by the login call is replayed on every later request, so no caller ever
 * handles credentials directly.
 *
 * Any response that arrives, whatever its status, is returned as `Ok`. Only failures
 * where no response is available (connection refused, timeout, unreadable upload file)
 * are `TransportError`s.
 */
use super::config::ClientConfig;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PATH_USER_STATUS: &str = "/user_status";
pub const PATH_LOGIN: &str = "/login";
pub const PATH_LOGOUT: &str = "/logout";
pub const PATH_LIST_DATASETS: &str = "/list_csvs";
pub const PATH_UPLOAD_DATASET: &str = "/upload_csv";
pub const PATH_QUERY: &str = "/query";
pub const UPLOAD_FIELD_NAME: &str = "file";

// Any absolute base will do; only the path of the joined URL is kept.
const PATH_BUILDER_BASE: &str = "http://localhost/";

// Builds `/<route>/<id>` with `id` percent-encoded as a single path segment.
fn resource_path(route: &str, id: &str) -> Result<String> {
    let mut url = reqwest::Url::parse(PATH_BUILDER_BASE)
        .map_err(|e| TransportError::Client(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| TransportError::Client(format!("cannot build path for '{route}'")))?
        .clear()
        .push(route)
        .push(id);
    Ok(url.path().to_string())
}

pub fn delete_dataset_path(dataset_id: &str) -> Result<String> {
    resource_path("delete_csv", dataset_id)
}

pub fn dataset_details_path(dataset_id: &str) -> Result<String> {
    resource_path("db_info", dataset_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: &str) -> Self {
        TransportResponse {
            status,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn parse_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Network(String),
    File { path: PathBuf, message: String },
    Client(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(e) => write!(f, "Network error: {e}"),
            TransportError::File { path, message } => {
                write!(f, "Could not read upload file {path:?}: {message}")
            }
            TransportError::Client(e) => write!(f, "HTTP client error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::Client(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/*
 * The request surface used by the client logic. Implementations must be usable from
 * worker threads, hence `Send + Sync`.
 */
pub trait HttpTransportOperations: Send + Sync {
    fn get(&self, path: &str) -> Result<TransportResponse>;
    fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<TransportResponse>;
    fn post_file(
        &self,
        path: &str,
        field_name: &str,
        file_path: &Path,
    ) -> Result<TransportResponse>;
    fn delete(&self, path: &str) -> Result<TransportResponse>;
}

pub struct CoreHttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl CoreHttpTransport {
    /*
     * Builds a transport for the server named in `config`. The cookie store lives inside
     * the client, so one `CoreHttpTransport` corresponds to one browser-like session.
     */
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = config.server_url.trim_end_matches('/').to_string();
        log::debug!("CoreHttpTransport: Created for base URL '{base_url}'.");
        Ok(CoreHttpTransport { client, base_url })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn finish(
        &self,
        method: &str,
        path: &str,
        response: reqwest::blocking::Response,
    ) -> Result<TransportResponse> {
        let status = response.status().as_u16();
        let body = response.text()?;
        log::debug!(
            "CoreHttpTransport: {method} {path} -> {status} ({} bytes).",
            body.len()
        );
        Ok(TransportResponse { status, body })
    }
}

impl HttpTransportOperations for CoreHttpTransport {
    fn get(&self, path: &str) -> Result<TransportResponse> {
        log::trace!("CoreHttpTransport: GET {path}");
        let response = self.client.get(self.url_for(path)).send()?;
        self.finish("GET", path, response)
    }

    fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<TransportResponse> {
        log::trace!("CoreHttpTransport: POST {path}");
        let response = self.client.post(self.url_for(path)).json(body).send()?;
        self.finish("POST", path, response)
    }

    fn post_file(
        &self,
        path: &str,
        field_name: &str,
        file_path: &Path,
    ) -> Result<TransportResponse> {
        log::trace!("CoreHttpTransport: POST {path} (multipart file {file_path:?})");
        let form = reqwest::blocking::multipart::Form::new()
            .file(field_name.to_string(), file_path)
            .map_err(|e| TransportError::File {
                path: file_path.to_path_buf(),
                message: e.to_string(),
            })?;
        let response = self
            .client
            .post(self.url_for(path))
            .multipart(form)
            .send()?;
        self.finish("POST", path, response)
    }

    fn delete(&self, path: &str) -> Result<TransportResponse> {
        log::trace!("CoreHttpTransport: DELETE {path}");
        let response = self.client.delete(self.url_for(path)).send()?;
        self.finish("DELETE", path, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_response_success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(!TransportResponse::new(403, "").is_success());
        assert!(!TransportResponse::new(500, "").is_success());
    }

    #[test]
    fn test_new_strips_trailing_slash_from_base_url() {
        // Arrange
        let config = ClientConfig {
            server_url: "http://127.0.0.1:5999/".to_string(),
            request_timeout_secs: 1,
        };

        // Act
        let transport = CoreHttpTransport::new(&config).unwrap();

        // Assert
        assert_eq!(
            transport.url_for(PATH_LIST_DATASETS),
            "http://127.0.0.1:5999/list_csvs"
        );
    }

    #[test]
    fn test_post_file_reports_missing_file_without_network() {
        // Arrange
        let config = ClientConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
        };
        let transport = CoreHttpTransport::new(&config).unwrap();
        let missing = PathBuf::from("/definitely/not/here/data.csv");

        // Act
        let result = transport.post_file(PATH_UPLOAD_DATASET, UPLOAD_FIELD_NAME, &missing);

        // Assert
        match result {
            Err(TransportError::File { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected file error, got {other:?}"),
        }
    }

    #[test]
    fn test_resource_paths_embed_dataset_id() {
        assert_eq!(delete_dataset_path("abc").unwrap(), "/delete_csv/abc");
        assert_eq!(dataset_details_path("abc").unwrap(), "/db_info/abc");
    }

    #[test]
    fn test_resource_paths_escape_reserved_characters_in_id() {
        // Arrange
        let dataset_id = "a/b?c#d e";

        // Act
        let delete_path = delete_dataset_path(dataset_id).unwrap();
        let details_path = dataset_details_path(dataset_id).unwrap();

        // Assert
        assert_eq!(delete_path, "/delete_csv/a%2Fb%3Fc%23d%20e");
        assert_eq!(details_path, "/db_info/a%2Fb%3Fc%23d%20e");
    }
}
