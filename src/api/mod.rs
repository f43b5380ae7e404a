//! Thin wrappers over [`ApiClient`] for the backend's resources.
//!
//! Each call unwraps the `{ success, data }` envelope and, on failure, reports
//! the server's message or a fixed fallback such as "Failed to load habits".

pub mod analytics;
pub mod finance;
pub mod habits;
pub mod pomodoro;
pub mod reports;
pub mod roadmap;
pub mod tasks;
pub mod users;

use anyhow::{Result, bail};
use serde_json::Value;

use crate::client::ApiClient;
use crate::http::{ApiRequest, HttpError};

/// Wraps `error` with the server's message, or `fallback` when it sent none.
/// The original error stays reachable as the source.
pub fn format_error(error: HttpError, fallback: &str) -> anyhow::Error {
    let message = error.message().unwrap_or(fallback).to_string();
    anyhow::Error::new(error).context(message)
}

/// Checks that a resource id fits in a single path segment, so it cannot
/// redirect the call to another route.
fn segment(id: &str) -> Result<&str> {
    let unsafe_char =
        |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control();
    if id.is_empty() || id.chars().any(unsafe_char) {
        bail!("Invalid id '{}'", id.escape_debug());
    }
    Ok(id)
}

/// Returns the envelope's `data` member.
async fn fetch_data(client: &ApiClient, request: ApiRequest, fallback: &str) -> Result<Value> {
    let response = client
        .send(request)
        .await
        .map_err(|e| format_error(e, fallback))?;
    Ok(response.data().clone())
}

/// Returns the whole response body.
async fn fetch_body(client: &ApiClient, request: ApiRequest, fallback: &str) -> Result<Value> {
    let response = client
        .send(request)
        .await
        .map_err(|e| format_error(e, fallback))?;
    Ok(response.body)
}

/// Returns the items of a paginated `{ data: { data: [...], pagination } }`
/// envelope, or nothing.
async fn fetch_page(client: &ApiClient, request: ApiRequest, fallback: &str) -> Result<Vec<Value>> {
    let data = fetch_data(client, request, fallback).await?;
    Ok(match data.get("data") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    })
}
