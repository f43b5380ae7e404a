use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Failure of a single API call.
#[derive(Debug)]
pub enum HttpError {
    /// The server answered with a non-success status.
    Status {
        status: StatusCode,
        message: Option<String>,
        body: Value,
    },
    /// The request never produced a response (connection, TLS, body read).
    Transport(reqwest::Error),
    /// The response body did not have the expected shape.
    Decode(String),
    /// The credential store could not be read or written.
    Credentials(String),
    /// The static fixture transport has nothing for this route.
    Fixture(String),
    /// Only GET, POST, PATCH, PUT and DELETE are accepted.
    UnsupportedMethod(Method),
}

impl HttpError {
    /// Builds a status error from a response body, pulling the server message
    /// out of the `error` field, falling back to `message`.
    pub fn from_status(status: StatusCode, body: Value) -> Self {
        let message = ["error", "message"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .map(str::to_owned);

        HttpError::Status {
            status,
            message,
            body,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The message reported by the server, if there was one.
    pub fn message(&self) -> Option<&str> {
        match self {
            HttpError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::Status {
                status,
                message: Some(msg),
                ..
            } => write!(f, "HTTP {}: {}", status.as_u16(), msg),
            HttpError::Status { status, .. } => {
                write!(f, "Request failed with status code {}", status.as_u16())
            }
            HttpError::Transport(e) => write!(f, "Request failed: {}", e),
            HttpError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
            HttpError::Credentials(msg) => write!(f, "Credential storage error: {}", msg),
            HttpError::Fixture(msg) => write!(f, "{}", msg),
            HttpError::UnsupportedMethod(method) => {
                write!(f, "Unsupported HTTP method: {}", method)
            }
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
