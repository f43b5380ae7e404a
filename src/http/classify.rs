//! Classification of failed calls into the failure classes the client can
//! recover from.

use reqwest::StatusCode;

use super::HttpError;

/// Substrings of a 401 message that mean the session credential is stale.
const SESSION_PATTERNS: &[&str] = &["expired", "token", "invalid"];

/// Substrings of a 403 message that mean the anti-forgery token was rejected.
const ANTI_FORGERY_PATTERNS: &[&str] = &["csrf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 401 whose message points at an expired or invalid token.
    SessionExpired,
    /// HTTP 403 whose message points at the anti-forgery check.
    AntiForgeryRejected,
    /// Anything else; surfaced to the caller unchanged.
    Other,
}

/// Classifies an error as recoverable or not.
pub fn classify(error: &HttpError) -> FailureClass {
    let HttpError::Status {
        status, message, ..
    } = error
    else {
        return FailureClass::Other;
    };

    let message = message.as_deref().unwrap_or_default().to_lowercase();
    let matches_any = |patterns: &[&str]| patterns.iter().any(|p| message.contains(p));

    match *status {
        StatusCode::UNAUTHORIZED if matches_any(SESSION_PATTERNS) => FailureClass::SessionExpired,
        StatusCode::FORBIDDEN if matches_any(ANTI_FORGERY_PATTERNS) => {
            FailureClass::AntiForgeryRejected
        }
        _ => FailureClass::Other,
    }
}
