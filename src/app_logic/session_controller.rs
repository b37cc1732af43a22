/*
 * Holds the client-side authentication record: who is logged in and in which phase
 * the login is. It also owns the session epoch, a counter bumped on every reset.
 * Requests capture the epoch when they are dispatched; a completion whose epoch no
 * longer matches belongs to a session that has since been torn down and must not be
 * applied.
 *
 * The request flow itself (restore, login, logout) is driven by `ClientLogic`; this
 * type only enforces the state transitions.
 */
use super::client_error::ClientError;
use crate::core::{DEFAULT_DATASET_LIMIT, SessionState};

#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    username: String,
    epoch: u64,
    dataset_limit: u32,
}

/*
 * Trims `raw` and rejects names that are empty afterwards. The trimmed name is what
 * gets sent and displayed.
 */
pub fn validate_username(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation("Please enter a username".to_string()));
    }
    Ok(trimmed.to_string())
}

impl SessionController {
    pub fn new() -> Self {
        SessionController {
            state: SessionState::LoggedOut,
            username: String::new(),
            epoch: 0,
            dataset_limit: DEFAULT_DATASET_LIMIT,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn dataset_limit(&self) -> u32 {
        self.dataset_limit
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::LoggedIn
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn begin_login(&mut self, username: &str) {
        debug_assert_eq!(self.state, SessionState::LoggedOut);
        self.state = SessionState::LoggingIn;
        self.username = username.to_string();
    }

    pub fn complete_login(&mut self) {
        self.state = SessionState::LoggedIn;
        log::info!("SessionController: Logged in as '{}'.", self.username);
    }

    pub fn fail_login(&mut self) {
        self.state = SessionState::LoggedOut;
        self.username.clear();
    }

    // Adopts a session that already exists on the server (found at startup).
    pub fn restore(&mut self, username: &str, dataset_limit: Option<u32>) {
        self.state = SessionState::LoggedIn;
        self.username = username.to_string();
        if let Some(limit) = dataset_limit {
            self.dataset_limit = limit;
        }
        log::info!("SessionController: Restored session for '{username}'.");
    }

    /*
     * Returns to LoggedOut and starts a new epoch, so any request still in flight
     * for the old session will be discarded when it completes.
     */
    pub fn reset(&mut self) {
        self.state = SessionState::LoggedOut;
        self.username.clear();
        self.dataset_limit = DEFAULT_DATASET_LIMIT;
        self.epoch += 1;
        log::debug!("SessionController: Reset, now at epoch {}.", self.epoch);
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_trims_and_rejects_blank() {
        assert_eq!(validate_username("  alice "), Ok("alice".to_string()));
        assert!(matches!(validate_username(""), Err(ClientError::Validation(_))));
        assert!(matches!(validate_username(" \t\n"), Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_login_transitions_keep_username_invariant() {
        // Arrange
        let mut session = SessionController::new();
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(session.username().is_empty());

        // Act & Assert: failed attempt
        session.begin_login("bob");
        assert_eq!(session.state(), SessionState::LoggingIn);
        assert_eq!(session.username(), "bob");
        session.fail_login();
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(session.username().is_empty());

        // Act & Assert: successful attempt
        session.begin_login("bob");
        session.complete_login();
        assert!(session.is_logged_in());
        assert_eq!(session.username(), "bob");
    }

    #[test]
    fn test_reset_bumps_epoch_and_restores_defaults() {
        let mut session = SessionController::new();
        session.restore("carol", Some(3));
        let epoch_before = session.epoch();
        assert_eq!(session.dataset_limit(), 3);

        session.reset();

        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(session.username().is_empty());
        assert_eq!(session.dataset_limit(), DEFAULT_DATASET_LIMIT);
        assert!(!session.is_current(epoch_before));
        assert!(session.is_current(epoch_before + 1));
    }
}
