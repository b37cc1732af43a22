/*
 * Manages the client's persistent settings: which server to talk to and how long a
 * request may take. Settings are stored as JSON in the per-user local configuration
 * directory resolved by `path_utils`. A missing or empty file means "use defaults",
 * so a first run needs no setup.
 *
 * As elsewhere in the core, access goes through a trait (`ConfigManagerOperations`)
 * so the front end can be wired to a mock in tests; `CoreConfigManager` is the
 * file-backed implementation.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

pub const CLIENT_CONFIG_FILENAME: &str = "client_config.json";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration format error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub trait ConfigManagerOperations: Send + Sync {
    fn load_config(&self, app_name: &str) -> Result<ClientConfig>;
    fn save_config(&self, app_name: &str, config: &ClientConfig) -> Result<()>;
}

pub struct CoreConfigManager {}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {}
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn load_config_from_dir(config_dir: &Path) -> Result<ClientConfig> {
    let file_path = config_dir.join(CLIENT_CONFIG_FILENAME);
    if !file_path.exists() {
        log::debug!("CoreConfigManager: Config file {file_path:?} does not exist, using defaults.");
        return Ok(ClientConfig::default());
    }
    if fs::metadata(&file_path)?.len() == 0 {
        log::debug!("CoreConfigManager: Config file {file_path:?} is empty, using defaults.");
        return Ok(ClientConfig::default());
    }
    let reader = BufReader::new(File::open(&file_path)?);
    let config: ClientConfig = serde_json::from_reader(reader)?;
    log::debug!("CoreConfigManager: Loaded {config:?} from {file_path:?}.");
    Ok(config)
}

pub(crate) fn save_config_to_dir(config_dir: &Path, config: &ClientConfig) -> Result<()> {
    let file_path = config_dir.join(CLIENT_CONFIG_FILENAME);
    let mut writer = BufWriter::new(File::create(&file_path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.flush()?;
    log::debug!("CoreConfigManager: Saved {config:?} to {file_path:?}.");
    Ok(())
}

impl ConfigManagerOperations for CoreConfigManager {
    /*
     * Loads the client configuration for `app_name` from the directory given by
     * `path_utils::get_base_app_config_local_dir`. Fields absent from the file take
     * their default values.
     */
    fn load_config(&self, app_name: &str) -> Result<ClientConfig> {
        log::trace!("CoreConfigManager: Loading config for app '{app_name}'");
        let config_dir = path_utils::get_base_app_config_local_dir(app_name)
            .ok_or(ConfigError::NoProjectDirectory)?;
        load_config_from_dir(&config_dir)
    }

    fn save_config(&self, app_name: &str, config: &ClientConfig) -> Result<()> {
        log::trace!("CoreConfigManager: Saving config for app '{app_name}'");
        let config_dir = path_utils::get_base_app_config_local_dir(app_name)
            .ok_or(ConfigError::NoProjectDirectory)?;
        save_config_to_dir(&config_dir, config)
    }
}
