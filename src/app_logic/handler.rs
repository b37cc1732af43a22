use super::client_error::{ClientError, Result};
use super::client_snapshot::ClientSnapshot;
use super::dataset_registry::DatasetRegistry;
use super::pending_operations::{OperationKind, PendingOperations};
use super::query_orchestrator::QueryOrchestrator;
use super::session_controller::{SessionController, validate_username};
use crate::core::models::{MessageResponse, QueryResponse, UserStatusResponse};
use crate::core::transport::{
    self, PATH_LIST_DATASETS, PATH_LOGIN, PATH_LOGOUT, PATH_QUERY, PATH_UPLOAD_DATASET,
    PATH_USER_STATUS, UPLOAD_FIELD_NAME,
};
use crate::core::{
    Dataset, DatasetDetails, FailureClass, HttpTransportOperations, QueryResult, SessionState,
    TaskRunnerOperations, TransportError, TransportResponse, classify,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

pub(crate) const MSG_SESSION_EXPIRED: &str = "session expired";
pub(crate) const MSG_LOGIN_FAILED: &str = "login failed";
pub(crate) const MSG_LOAD_DATASETS_FAILED: &str = "failed to load datasets";
pub(crate) const MSG_UPLOAD_FAILED: &str = "upload failed";
pub(crate) const MSG_QUERY_FAILED: &str = "query failed";
pub(crate) const MSG_DELETE_FAILED: &str = "delete failed";
pub(crate) const MSG_DETAILS_FAILED: &str = "failed to load dataset details";
pub(crate) const MSG_NO_FILE_SELECTED: &str = "Please choose a file to upload";
pub(crate) const MSG_NO_DATASET_SELECTED: &str = "Please select a dataset";
pub(crate) const MSG_EMPTY_QUESTION: &str = "Please enter a question";

type RequestOutcome = std::result::Result<TransportResponse, TransportError>;

// Identifies the request a completion belongs to, with whatever its handler needs.
#[derive(Debug, Clone)]
pub(crate) enum RequestTag {
    SessionStatus,
    Login { username: String },
    Logout,
    DatasetList { sequence: u64 },
    Upload { file: PathBuf },
    Query { dataset_id: String },
    Delete { dataset_id: String },
    Details { dataset_id: String },
}

// What a finished request job reports back. Built on a worker thread, applied on ours.
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) epoch: u64,
    pub(crate) tag: RequestTag,
    pub(crate) outcome: RequestOutcome,
}

/*
 * Owns all client state and drives every operation against the collaborator service.
 *
 * Operations are called on a single interaction thread and never block: each one
 * validates locally, updates the pending flags, and hands the HTTP call to the
 * `TaskRunnerOperations` implementation. The job's only side effect is sending a
 * `Completion` back over a channel. State changes happen exclusively when the
 * interaction thread drains that channel via `process_completions` or
 * `wait_for_completion`, so no lock is ever held on client state.
 *
 * Completions are tagged with the session epoch current at dispatch. Anything
 * tagged with an older epoch was started by a session that has since been reset
 * and is dropped unapplied.
 */
pub struct ClientLogic {
    transport: Arc<dyn HttpTransportOperations>,
    task_runner: Arc<dyn TaskRunnerOperations>,
    completion_sender: Sender<Completion>,
    completion_receiver: Receiver<Completion>,
    in_flight: usize,
    pub(crate) session: SessionController,
    pub(crate) registry: DatasetRegistry,
    pub(crate) query: QueryOrchestrator,
    pub(crate) pending: PendingOperations,
    pub(crate) error_message: Option<String>,
    pub(crate) notice: Option<String>,
}

impl ClientLogic {
    pub fn new(
        transport: Arc<dyn HttpTransportOperations>,
        task_runner: Arc<dyn TaskRunnerOperations>,
    ) -> Self {
        let (completion_sender, completion_receiver) = mpsc::channel();
        ClientLogic {
            transport,
            task_runner,
            completion_sender,
            completion_receiver,
            in_flight: 0,
            session: SessionController::new(),
            registry: DatasetRegistry::new(),
            query: QueryOrchestrator::new(),
            pending: PendingOperations::new(),
            error_message: None,
            notice: None,
        }
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            session_state: self.session.state(),
            username: self.session.username().to_string(),
            datasets: self.registry.datasets().to_vec(),
            dataset_limit: self.session.dataset_limit(),
            selected_dataset_id: self.registry.selected_id().map(str::to_string),
            dataset_details: self.registry.details().cloned(),
            chosen_upload_file: self.registry.chosen_upload_file().map(Path::to_path_buf),
            query_phase: self.query.phase(),
            query_result: self.query.result().cloned(),
            error_message: self.error_message.clone(),
            notice: self.notice.clone(),
            pending: self.pending.clone(),
        }
    }

    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.pending.is_pending(kind)
    }

    // Number of dispatched requests whose completion has not been processed yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    // --- Dispatch ---

    /*
     * Hands `request` to the task runner. If no worker can be started, the request is
     * completed on the spot with a transport error, so its pending flag and in-flight
     * count are released the same way a failed request would release them.
     */
    fn dispatch<F>(&mut self, label: &str, tag: RequestTag, request: F)
    where
        F: FnOnce(&dyn HttpTransportOperations) -> RequestOutcome + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let sender = self.completion_sender.clone();
        let epoch = self.session.epoch();
        let job_label = label.to_string();
        let job_tag = tag.clone();
        self.in_flight += 1;
        log::debug!("ClientLogic: Dispatching '{label}' (epoch {epoch}).");
        let spawned = self.task_runner.spawn(
            label,
            Box::new(move || {
                let outcome = request(transport.as_ref());
                let completion = Completion {
                    epoch,
                    tag: job_tag,
                    outcome,
                };
                if sender.send(completion).is_err() {
                    log::debug!(
                        "ClientLogic: Completion of '{job_label}' dropped, receiver is gone."
                    );
                }
            }),
        );
        if let Err(e) = spawned {
            log::error!("ClientLogic: Could not start worker for '{label}': {e}");
            self.handle_completion(Completion {
                epoch,
                tag,
                outcome: Err(TransportError::Client(format!(
                    "could not start request worker: {e}"
                ))),
            });
        }
    }

    // Clears the status slots at the start of any user-initiated attempt.
    fn begin_attempt(&mut self) {
        self.error_message = None;
        self.notice = None;
    }

    fn require_logged_in(&self) -> Result<()> {
        if !self.session.is_logged_in() {
            return Err(ClientError::NotLoggedIn);
        }
        Ok(())
    }

    fn reject(&mut self, message: &str) -> Result<()> {
        self.error_message = Some(message.to_string());
        Err(ClientError::Validation(message.to_string()))
    }

    // --- Session operations ---

    /*
     * Asks the service whether the cookie jar already carries a live session. Meant to
     * be called once at startup. A failure here is logged and otherwise ignored: the
     * client simply stays logged out.
     */
    pub fn restore_session(&mut self) -> Result<()> {
        self.pending.ensure_idle(OperationKind::Login)?;
        if self.session.state() != SessionState::LoggedOut {
            return Err(ClientError::AlreadyLoggedIn);
        }
        self.pending.mark(OperationKind::Login);
        self.dispatch("user_status", RequestTag::SessionStatus, |t| {
            t.get(PATH_USER_STATUS)
        });
        Ok(())
    }

    pub fn login(&mut self, username: &str) -> Result<()> {
        self.pending.ensure_idle(OperationKind::Login)?;
        if self.session.state() != SessionState::LoggedOut {
            return Err(ClientError::AlreadyLoggedIn);
        }
        self.begin_attempt();
        let username = match validate_username(username) {
            Ok(name) => name,
            Err(e) => {
                self.error_message = Some(e.to_string());
                return Err(e);
            }
        };

        self.pending.mark(OperationKind::Login);
        self.session.begin_login(&username);
        let body = json!({ "username": username });
        self.dispatch("login", RequestTag::Login { username }, move |t| {
            t.post_json(PATH_LOGIN, &body)
        });
        Ok(())
    }

    /*
     * Ends the session. The client-side reset happens immediately and unconditionally;
     * the remote logout is sent best-effort and its outcome is only logged. Calling this
     * while already logged out leaves the state unchanged.
     */
    pub fn logout(&mut self) {
        let had_session = self.session.state() != SessionState::LoggedOut;
        self.reset_client_state();
        if had_session {
            log::info!("ClientLogic: Logged out.");
            self.dispatch("logout", RequestTag::Logout, |t| {
                t.post_json(PATH_LOGOUT, &json!({}))
            });
        }
    }

    fn reset_client_state(&mut self) {
        self.session.reset();
        self.registry.clear();
        self.query.clear();
        self.pending.clear_all();
        self.error_message = None;
        self.notice = None;
    }

    fn handle_authorization_loss(&mut self, during: OperationKind) {
        log::warn!("ClientLogic: Authorization lost during {during}; resetting session.");
        self.reset_client_state();
        self.error_message = Some(MSG_SESSION_EXPIRED.to_string());
    }

    // --- Dataset operations ---

    pub fn refresh_datasets(&mut self) -> Result<()> {
        self.require_logged_in()?;
        self.pending.ensure_idle(OperationKind::Refresh)?;
        self.begin_attempt();
        self.start_refresh();
        Ok(())
    }

    // Issued after login, restore, upload and delete. Supersedes any refresh in flight.
    fn start_refresh(&mut self) {
        let sequence = self.registry.next_refresh_sequence();
        self.pending.mark(OperationKind::Refresh);
        self.dispatch("list_csvs", RequestTag::DatasetList { sequence }, |t| {
            t.get(PATH_LIST_DATASETS)
        });
    }

    pub fn choose_upload_file(&mut self, file: Option<PathBuf>) {
        self.registry.choose_upload_file(file);
    }

    /*
     * Uploads `file` as a new dataset. The dataset limit is not checked here; the
     * service enforces it and reports a refusal as an ordinary failure message.
     */
    pub fn upload_dataset(&mut self, file: Option<&Path>) -> Result<()> {
        self.require_logged_in()?;
        self.pending.ensure_idle(OperationKind::Upload)?;
        self.begin_attempt();
        let Some(file) = file else {
            return self.reject(MSG_NO_FILE_SELECTED);
        };

        self.pending.mark(OperationKind::Upload);
        let file = file.to_path_buf();
        let tag = RequestTag::Upload { file: file.clone() };
        self.dispatch("upload_csv", tag, move |t| {
            t.post_file(PATH_UPLOAD_DATASET, UPLOAD_FIELD_NAME, &file)
        });
        Ok(())
    }

    pub fn upload_chosen_file(&mut self) -> Result<()> {
        let file = self.registry.chosen_upload_file().map(Path::to_path_buf);
        self.upload_dataset(file.as_deref())
    }

    pub fn select_dataset(&mut self, dataset_id: &str) -> Result<()> {
        self.require_logged_in()?;
        self.registry.select(dataset_id)
    }

    pub fn clear_selection(&mut self) {
        self.registry.clear_selection();
    }

    pub fn delete_dataset(&mut self, dataset_id: &str) -> Result<()> {
        self.require_logged_in()?;
        self.pending.ensure_idle(OperationKind::Delete)?;
        self.begin_attempt();
        if dataset_id.trim().is_empty() {
            return self.reject(MSG_NO_DATASET_SELECTED);
        }

        self.pending.mark(OperationKind::Delete);
        let tag = RequestTag::Delete {
            dataset_id: dataset_id.to_string(),
        };
        let path = transport::delete_dataset_path(dataset_id);
        self.dispatch("delete_csv", tag, move |t| path.and_then(|path| t.delete(&path)));
        Ok(())
    }

    pub fn load_dataset_details(&mut self, dataset_id: &str) -> Result<()> {
        self.require_logged_in()?;
        self.pending.ensure_idle(OperationKind::Details)?;
        self.begin_attempt();
        if dataset_id.trim().is_empty() {
            return self.reject(MSG_NO_DATASET_SELECTED);
        }

        self.pending.mark(OperationKind::Details);
        let tag = RequestTag::Details {
            dataset_id: dataset_id.to_string(),
        };
        let path = transport::dataset_details_path(dataset_id);
        self.dispatch("db_info", tag, move |t| path.and_then(|path| t.get(&path)));
        Ok(())
    }

    // --- Query operations ---

    /*
     * Submits a natural-language question against a dataset. The dataset id is not
     * checked against the local list; the service is the authority on what exists.
     * The previous result stays visible until this query resolves.
     */
    pub fn submit_query(&mut self, dataset_id: &str, question: &str) -> Result<()> {
        self.require_logged_in()?;
        self.pending.ensure_idle(OperationKind::Query)?;
        self.begin_attempt();
        if dataset_id.trim().is_empty() {
            return self.reject(MSG_NO_DATASET_SELECTED);
        }
        if question.trim().is_empty() {
            return self.reject(MSG_EMPTY_QUESTION);
        }

        self.pending.mark(OperationKind::Query);
        self.query.begin(dataset_id);
        let body = json!({ "db_id": dataset_id, "question": question });
        let tag = RequestTag::Query {
            dataset_id: dataset_id.to_string(),
        };
        self.dispatch("query", tag, move |t| t.post_json(PATH_QUERY, &body));
        Ok(())
    }

    pub fn submit_selected_query(&mut self, question: &str) -> Result<()> {
        let dataset_id = self.registry.selected_id().unwrap_or_default().to_string();
        self.submit_query(&dataset_id, question)
    }

    // --- Completion processing ---

    // Applies every completion that has already arrived. Returns how many were handled.
    pub fn process_completions(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.completion_receiver.try_recv() {
                Ok(completion) => {
                    self.handle_completion(completion);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::error!("ClientLogic: Completion channel disconnected.");
                    break;
                }
            }
        }
        handled
    }

    /*
     * Blocks for at most `timeout` until one completion arrives, then applies it.
     * Returns false immediately when nothing is in flight. Used by front ends that
     * have nothing else to do while waiting.
     */
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completion_receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.handle_completion(completion);
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "ClientLogic: No completion within {timeout:?} ({} in flight).",
                    self.in_flight
                );
                false
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::error!("ClientLogic: Completion channel disconnected.");
                false
            }
        }
    }

    pub(crate) fn handle_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !self.session.is_current(completion.epoch) {
            log::debug!(
                "ClientLogic: Discarding stale completion from epoch {} (now {}): {:?}",
                completion.epoch,
                self.session.epoch(),
                completion.tag
            );
            return;
        }

        let outcome = completion.outcome;
        match completion.tag {
            RequestTag::SessionStatus => self.on_session_status(outcome),
            RequestTag::Login { username } => self.on_login(username, outcome),
            RequestTag::Logout => self.on_logout(outcome),
            RequestTag::DatasetList { sequence } => self.on_dataset_list(sequence, outcome),
            RequestTag::Upload { file } => self.on_upload(file, outcome),
            RequestTag::Query { dataset_id } => self.on_query(dataset_id, outcome),
            RequestTag::Delete { dataset_id } => self.on_delete(dataset_id, outcome),
            RequestTag::Details { dataset_id } => self.on_details(dataset_id, outcome),
        }
    }

    /*
     * Turns a request outcome into either the decoded success value or a classified
     * failure. Every failure goes through `classify` exactly once, including a 2xx
     * response whose body `decode` cannot use.
     */
    fn decode_outcome<T, F>(
        outcome: RequestOutcome,
        fallback: &str,
        decode: F,
    ) -> std::result::Result<T, FailureClass>
    where
        F: FnOnce(&TransportResponse) -> Option<T>,
    {
        match outcome {
            Ok(response) if response.is_success() => decode(&response).ok_or_else(|| {
                log::warn!(
                    "ClientLogic: Unusable {} response body: {}",
                    response.status,
                    response.body
                );
                classify(Some(response.status), Some(&response.body), fallback)
            }),
            Ok(response) => Err(classify(
                Some(response.status),
                Some(&response.body),
                fallback,
            )),
            Err(e) => {
                log::warn!("ClientLogic: Request failed without a response: {e}");
                Err(classify(None, None, fallback))
            }
        }
    }

    // Success bodies of login, upload and delete carry at most a message; any 2xx will do.
    fn decode_message(
        outcome: RequestOutcome,
        fallback: &str,
    ) -> std::result::Result<Option<String>, FailureClass> {
        Self::decode_outcome(outcome, fallback, |response| {
            Some(
                response
                    .parse_json::<MessageResponse>()
                    .ok()
                    .and_then(|m| m.message),
            )
        })
    }

    fn on_session_status(&mut self, outcome: RequestOutcome) {
        self.pending.finish(OperationKind::Login);
        let decoded = Self::decode_outcome(outcome, "", |response| {
            response.parse_json::<UserStatusResponse>().ok()
        });
        match decoded {
            Ok(status) => {
                let username = status.username.as_deref().map(str::trim).unwrap_or("");
                if status.logged_in && !username.is_empty() {
                    if self.session.state() == SessionState::LoggedOut {
                        self.session.restore(username, status.csv_limit);
                        self.start_refresh();
                    }
                } else {
                    log::info!("ClientLogic: No existing session to restore.");
                }
            }
            Err(class) => {
                log::info!("ClientLogic: Session restore failed ({class:?}); staying logged out.");
            }
        }
    }

    fn on_login(&mut self, username: String, outcome: RequestOutcome) {
        self.pending.finish(OperationKind::Login);
        if self.session.state() != SessionState::LoggingIn {
            log::warn!("ClientLogic: Login completion for '{username}' arrived outside a login.");
            return;
        }
        match Self::decode_message(outcome, MSG_LOGIN_FAILED) {
            Ok(_) => {
                self.session.complete_login();
                self.start_refresh();
            }
            Err(FailureClass::AuthorizationLoss) => {
                self.handle_authorization_loss(OperationKind::Login)
            }
            Err(FailureClass::ApplicationError(message)) => {
                log::info!("ClientLogic: Login as '{username}' refused: {message}");
                self.session.fail_login();
                self.error_message = Some(message);
            }
        }
    }

    fn on_logout(&mut self, outcome: RequestOutcome) {
        match Self::decode_message(outcome, "logout failed") {
            Ok(_) => log::debug!("ClientLogic: Remote logout acknowledged."),
            Err(class) => log::info!("ClientLogic: Remote logout failed ({class:?}); ignored."),
        }
    }

    fn on_dataset_list(&mut self, sequence: u64, outcome: RequestOutcome) {
        if !self.registry.is_latest_refresh(sequence) {
            log::debug!("ClientLogic: Ignoring superseded dataset refresh #{sequence}.");
            return;
        }
        self.pending.finish(OperationKind::Refresh);
        let decoded = Self::decode_outcome(outcome, MSG_LOAD_DATASETS_FAILED, |response| {
            response.parse_json::<Vec<Dataset>>().ok()
        });
        match decoded {
            Ok(datasets) => self.registry.replace_all(datasets),
            Err(FailureClass::AuthorizationLoss) => {
                self.handle_authorization_loss(OperationKind::Refresh)
            }
            Err(FailureClass::ApplicationError(message)) => {
                log::warn!("ClientLogic: Dataset refresh failed: {message}");
                self.error_message = Some(MSG_LOAD_DATASETS_FAILED.to_string());
            }
        }
    }

    fn on_upload(&mut self, file: PathBuf, outcome: RequestOutcome) {
        self.pending.finish(OperationKind::Upload);
        match Self::decode_message(outcome, MSG_UPLOAD_FAILED) {
            Ok(message) => {
                log::info!("ClientLogic: Uploaded {file:?}.");
                self.registry.clear_uploaded_file(&file);
                self.notice = message;
                self.start_refresh();
            }
            Err(FailureClass::AuthorizationLoss) => {
                self.handle_authorization_loss(OperationKind::Upload)
            }
            Err(FailureClass::ApplicationError(message)) => {
                log::info!("ClientLogic: Upload of {file:?} failed: {message}");
                self.error_message = Some(message);
            }
        }
    }

    fn on_query(&mut self, dataset_id: String, outcome: RequestOutcome) {
        self.pending.finish(OperationKind::Query);
        let decoded = Self::decode_outcome(outcome, MSG_QUERY_FAILED, |response| {
            response
                .parse_json::<QueryResponse>()
                .ok()
                .and_then(QueryResponse::into_success)
        });
        match decoded {
            Ok(result) => {
                log::debug!("ClientLogic: Query on dataset '{dataset_id}' resolved.");
                self.query.resolve(result);
            }
            Err(FailureClass::AuthorizationLoss) => {
                self.handle_authorization_loss(OperationKind::Query)
            }
            Err(FailureClass::ApplicationError(message)) => {
                log::info!("ClientLogic: Query on dataset '{dataset_id}' failed: {message}");
                self.error_message = Some(message.clone());
                self.query.resolve(QueryResult::Failure { message });
            }
        }
    }

    fn on_delete(&mut self, dataset_id: String, outcome: RequestOutcome) {
        self.pending.finish(OperationKind::Delete);
        match Self::decode_message(outcome, MSG_DELETE_FAILED) {
            Ok(message) => {
                log::info!("ClientLogic: Deleted dataset '{dataset_id}'.");
                if self.registry.selected_id() == Some(dataset_id.as_str()) {
                    self.registry.clear_selection();
                }
                self.notice = message;
                self.start_refresh();
            }
            Err(FailureClass::AuthorizationLoss) => {
                self.handle_authorization_loss(OperationKind::Delete)
            }
            Err(FailureClass::ApplicationError(message)) => {
                self.error_message = Some(message);
            }
        }
    }

    fn on_details(&mut self, dataset_id: String, outcome: RequestOutcome) {
        self.pending.finish(OperationKind::Details);
        let decoded = Self::decode_outcome(outcome, MSG_DETAILS_FAILED, |response| {
            response.parse_json::<DatasetDetails>().ok()
        });
        match decoded {
            Ok(details) => self.registry.set_details(details),
            Err(FailureClass::AuthorizationLoss) => {
                self.handle_authorization_loss(OperationKind::Details)
            }
            Err(FailureClass::ApplicationError(message)) => {
                log::info!("ClientLogic: Details for dataset '{dataset_id}' failed: {message}");
                self.error_message = Some(message);
            }
        }
    }
}
