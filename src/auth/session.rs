use log::warn;
use reqwest::StatusCode;
use serde_json::Value;

use super::TokenPair;
use crate::http::HttpError;

pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Client-side route shown when the session cannot be recovered.
pub const LOGIN_ROUTE: &str = "/login";

/// Notified when the session is lost for good.
pub trait SessionListener: Send + Sync {
    fn on_signed_out(&self, login_route: &str);
}

/// Default listener: logs the redirect target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSessionListener;

impl SessionListener for LogSessionListener {
    fn on_signed_out(&self, login_route: &str) {
        warn!("Session could not be refreshed; redirecting to {}", login_route);
    }
}

/// Outcome of a failed session refresh. Cloned to every caller that waited on
/// the same refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryError {
    pub status: Option<StatusCode>,
    pub message: String,
}

impl RecoveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn signed_out() -> Self {
        Self::new("session is signed out")
    }
}

impl From<HttpError> for RecoveryError {
    fn from(error: HttpError) -> Self {
        Self {
            status: error.status(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session refresh failed: {}", self.message)
    }
}

impl std::error::Error for RecoveryError {}

/// Reads `{ token, refreshToken }` from an auth response, either at the top
/// level or inside the `data` envelope. Returns `None` without an access
/// token.
pub fn parse_token_pair(body: &Value) -> Option<TokenPair> {
    let source = match body.get("token") {
        Some(_) => body,
        None => body.get("data")?,
    };

    let field = |key: &str| {
        source
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    Some(TokenPair {
        access: Some(field("token")?),
        refresh: field("refreshToken"),
    })
}
