use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::Value;

use crate::api::format_error;
use crate::client::ApiClient;

use super::print_json;

/// Sends an arbitrary request through the authenticated client and prints the
/// response body.
#[tracing::instrument(skip(client, data, params))]
pub async fn request(
    client: &ApiClient,
    method: &str,
    path: &str,
    data: Option<&str>,
    params: &[(String, String)],
) -> Result<()> {
    let method = method
        .to_ascii_uppercase()
        .parse::<Method>()
        .with_context(|| format!("Invalid HTTP method '{}'", method))?;
    let body = data
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--data is not valid JSON")?;

    let response = client
        .request(method, path, body, params)
        .await
        .map_err(|e| format_error(e, "Request failed"))?;
    print_json(&response.body);
    Ok(())
}
