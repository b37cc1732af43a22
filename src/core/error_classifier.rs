/*
 * Maps a failed remote call to the client's reaction. This is the only place that
 * knows which status means "the session is gone"; every state owner routes its
 * failures through `classify` instead of inspecting statuses itself.
 */
use super::models::ErrorPayload;

pub const HTTP_STATUS_FORBIDDEN: u16 = 403;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    AuthorizationLoss,
    ApplicationError(String),
}

/*
 * Classifies a failure. `http_status` is `None` when no response arrived at all
 * (network failure); `backend_payload` is the raw response body if there was one.
 *
 * A forbidden status is an authorization loss whatever the payload says. Anything else
 * is an application error whose message is the payload's `error` field when it parses
 * and is non-empty, otherwise `fallback`.
 */
pub fn classify(
    http_status: Option<u16>,
    backend_payload: Option<&str>,
    fallback: &str,
) -> FailureClass {
    if http_status == Some(HTTP_STATUS_FORBIDDEN) {
        return FailureClass::AuthorizationLoss;
    }
    let reported = backend_payload
        .and_then(|body| serde_json::from_str::<ErrorPayload>(body).ok())
        .map(|payload| payload.error)
        .filter(|message| !message.trim().is_empty());
    FailureClass::ApplicationError(reported.unwrap_or_else(|| fallback.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_authorization_loss_regardless_of_payload() {
        assert_eq!(
            classify(
                Some(403),
                Some(r#"{"error":"CSV upload limit (5) reached."}"#),
                "upload failed"
            ),
            FailureClass::AuthorizationLoss
        );
        assert_eq!(classify(Some(403), None, "x"), FailureClass::AuthorizationLoss);
        assert_eq!(
            classify(Some(403), Some("<html>"), "x"),
            FailureClass::AuthorizationLoss
        );
    }

    #[test]
    fn test_reported_error_field_is_used() {
        assert_eq!(
            classify(Some(400), Some(r#"{"error":"limit reached"}"#), "upload failed"),
            FailureClass::ApplicationError("limit reached".to_string())
        );
    }

    #[test]
    fn test_fallback_used_for_network_failure_and_malformed_payloads() {
        let fallback = FailureClass::ApplicationError("query failed".to_string());
        assert_eq!(classify(None, None, "query failed"), fallback);
        assert_eq!(
            classify(Some(500), Some("Internal Server Error"), "query failed"),
            fallback
        );
        assert_eq!(
            classify(Some(500), Some(r#"{"message":"nope"}"#), "query failed"),
            fallback
        );
        assert_eq!(
            classify(Some(404), Some(r#"{"error":"  "}"#), "query failed"),
            fallback
        );
    }

    #[test]
    fn test_other_client_errors_are_application_errors() {
        assert_eq!(
            classify(Some(401), Some(r#"{"error":"Not logged in"}"#), "x"),
            FailureClass::ApplicationError("Not logged in".to_string())
        );
    }
}
