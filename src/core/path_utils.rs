/*
 * Resolves the per-user directories the client writes to: the local configuration
 * directory (settings) and, inside it, the log file used by the interactive front end.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

pub const LOG_FILE_NAME: &str = "client.log";

/*
 * Retrieves the application's local (non-roaming) configuration directory, creating it
 * if needed. Returns `None` if no home directory can be determined or the directory
 * cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving config local dir for '{app_name}'");
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if !config_path.exists() {
        if let Err(e) = fs::create_dir_all(config_path) {
            log::error!("PathUtils: Failed to create config directory {config_path:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created config directory {config_path:?}");
    }
    Some(config_path.to_path_buf())
}

pub fn get_log_file_path(app_name: &str) -> Option<PathBuf> {
    get_base_app_config_local_dir(app_name).map(|dir| dir.join(LOG_FILE_NAME))
}
