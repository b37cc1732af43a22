use neurobase_client::app_logic::{ClientError, ClientLogic, ClientSnapshot};
use neurobase_client::core::path_utils;
use neurobase_client::core::{
    ClientConfig, ConfigManagerOperations, CoreConfigManager, CoreHttpTransport,
    ThreadTaskRunner,
};
use neurobase_client::presentation::{self, HELP_TEXT, ReplCommand};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const APP_NAME: &str = "NeuroBaseClient";

// Returns the value following `--server`, if given.
fn server_override(args: &[String]) -> Option<String> {
    args.iter()
        .position(|arg| arg == "--server")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn load_config(config_manager: &dyn ConfigManagerOperations) -> ClientConfig {
    let mut config = config_manager.load_config(APP_NAME).unwrap_or_else(|e| {
        log::warn!("Main: Could not load config, using defaults: {e}");
        ClientConfig::default()
    });
    let args: Vec<String> = std::env::args().collect();
    if let Some(server_url) = server_override(&args) {
        config.server_url = server_url;
        if let Err(e) = config_manager.save_config(APP_NAME, &config) {
            log::warn!("Main: Could not save config: {e}");
        }
    }
    config
}

// Applies completions until no request is left in flight.
fn settle(logic: &mut ClientLogic, timeout: Duration) {
    while logic.wait_for_completion(timeout) {}
}

fn print_status_lines(snapshot: &ClientSnapshot) {
    if let Some(notice) = &snapshot.notice {
        println!("{notice}");
    }
    if let Some(error) = &snapshot.error_message {
        println!("Error: {error}");
    }
}

fn execute(logic: &mut ClientLogic, command: ReplCommand) -> Result<(), ClientError> {
    match command {
        ReplCommand::Login(name) => logic.login(&name),
        ReplCommand::Logout => {
            logic.logout();
            Ok(())
        }
        ReplCommand::List => logic.refresh_datasets(),
        ReplCommand::ChooseFile(path) => {
            logic.choose_upload_file(Some(path));
            Ok(())
        }
        ReplCommand::Upload(Some(path)) => logic.upload_dataset(Some(&path)),
        ReplCommand::Upload(None) => logic.upload_chosen_file(),
        ReplCommand::Select(id) => logic.select_dataset(&id),
        ReplCommand::Ask(question) => logic.submit_selected_query(&question),
        ReplCommand::Delete(id) => {
            let id = id.or_else(|| logic.snapshot().selected_dataset_id);
            logic.delete_dataset(id.as_deref().unwrap_or_default())
        }
        ReplCommand::Info(id) => {
            let id = id.or_else(|| logic.snapshot().selected_dataset_id);
            logic.load_dataset_details(id.as_deref().unwrap_or_default())
        }
        ReplCommand::Status | ReplCommand::Help | ReplCommand::Quit => Ok(()),
    }
}

fn main() -> ExitCode {
    if let Some(log_file) = path_utils::get_log_file_path(APP_NAME) {
        if let Err(e) = neurobase_client::initialize_file_logging(&log_file) {
            eprintln!("Could not open log file {log_file:?}: {e}");
        }
    }
    log::info!("Main: Starting.");

    let config_manager = CoreConfigManager::new();
    let config = load_config(&config_manager);
    let transport = match CoreHttpTransport::new(&config) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Could not create HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    // Longer than the request timeout, so a hung request surfaces as its own failure first.
    let wait_timeout = Duration::from_secs(config.request_timeout_secs + 5);

    let mut logic = ClientLogic::new(Arc::new(transport), Arc::new(ThreadTaskRunner::new()));
    println!("NeuroBase client, server {}", config.server_url);
    if logic.restore_session().is_ok() {
        settle(&mut logic, wait_timeout);
    }
    print!("{}", presentation::render_snapshot_summary(&logic.snapshot()));
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Could not read input: {e}");
                break;
            }
            None => break,
        };

        let command = match presentation::parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        let before = logic.snapshot();
        match command {
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("{HELP_TEXT}");
                continue;
            }
            ReplCommand::Status => {
                print!("{}", presentation::render_snapshot_summary(&before));
                continue;
            }
            _ => {}
        }

        let shows_query = matches!(command, ReplCommand::Ask(_));
        let shows_details = matches!(command, ReplCommand::Info(_));
        let shows_list = matches!(
            command,
            ReplCommand::Login(_)
                | ReplCommand::List
                | ReplCommand::Upload(_)
                | ReplCommand::Delete(_)
        );
        if let Err(e) = execute(&mut logic, command) {
            println!("{e}");
            continue;
        }
        settle(&mut logic, wait_timeout);

        let after = logic.snapshot();
        if shows_list || after.session_state != before.session_state {
            print!("{}", presentation::render_snapshot_summary(&after));
        } else {
            print_status_lines(&after);
        }
        if shows_query {
            if let Some(result) = &after.query_result {
                print!("{}", presentation::render_query_result(result));
            }
        }
        if shows_details {
            if let Some(details) = &after.dataset_details {
                print!("{}", presentation::render_dataset_details(details));
            }
        }
    }

    logic.logout();
    settle(&mut logic, wait_timeout);
    log::info!("Main: Exiting.");
    ExitCode::SUCCESS
}
