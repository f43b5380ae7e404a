use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::fmt::Display;

use super::HttpError;

/// An outgoing API call, before the middleware pipeline has attached
/// credentials.
///
/// The two `*_retried` markers travel with the request through the recovery
/// loop so each failure class is recovered from at most once per call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub params: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub(crate) session_retried: bool,
    pub(crate) csrf_retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            params: Vec::new(),
            headers: HeaderMap::new(),
            session_retried: false,
            csrf_retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Display) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds a query parameter only when a value is present.
    pub fn with_optional_param<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    pub fn with_params<'a>(self, params: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        params
            .into_iter()
            .fold(self, |req, (key, value)| req.with_param(key, value))
    }

    /// POST, PUT, PATCH and DELETE change server state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    pub fn is_supported_method(&self) -> bool {
        self.method == Method::GET || self.is_mutating()
    }

    pub fn session_retried(&self) -> bool {
        self.session_retried
    }

    pub fn csrf_retried(&self) -> bool {
        self.csrf_retried
    }
}

/// A decoded server response. Non-JSON bodies are kept as a JSON string and
/// empty bodies become `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn decode_body(bytes: &[u8]) -> Value {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Turns a non-success status into an [`HttpError::Status`].
    pub fn into_result(self) -> Result<Self, HttpError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(HttpError::from_status(self.status, self.body))
        }
    }

    /// The `data` member of the `{ success, data }` envelope, or `null`.
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }
}
