/*
 * Client for the NeuroBase natural-language query service. Users log in with a name,
 * upload CSV files as datasets, and ask questions that the service translates into
 * SQL and runs against a chosen dataset.
 *
 * `core` holds the stateless pieces (models, transport, classification, config),
 * `app_logic` holds the client state and operations, and `presentation` turns that
 * state into text for the command-line front end in `main.rs`.
 */
pub mod app_logic;
pub mod core;
pub mod presentation;

use simplelog::{ColorChoice, Config, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Once;

pub const LOG_LEVEL_ENV_VAR: &str = "NEUROBASE_LOG";

static LOGGER_INIT: Once = Once::new();

fn log_level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV_VAR)
        .ok()
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_custom(time::macros::format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .set_thread_level(LevelFilter::Debug)
        .build()
}

/*
 * Sets up terminal logging once per process. Safe to call from every test; later
 * calls are no-ops.
 */
pub fn initialize_logging() {
    LOGGER_INIT.call_once(|| {
        if let Err(e) = TermLogger::init(
            log_level_from_env(),
            log_config(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ) {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
}

// Logs to `log_file` instead of the terminal, so log lines do not interleave with the prompt.
pub fn initialize_file_logging(log_file: &Path) -> std::io::Result<()> {
    let file = File::create(log_file)?;
    LOGGER_INIT.call_once(|| {
        if let Err(e) = simplelog::WriteLogger::init(log_level_from_env(), log_config(), file) {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
    Ok(())
}
