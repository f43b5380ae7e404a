use anyhow::Result;
use serde_json::{Value, json};

use super::{fetch_body, fetch_data};
use crate::client::ApiClient;
use crate::http::ApiRequest;

/// The signed-in user. Servers answer either with the bare user or inside the
/// `data` envelope.
#[tracing::instrument(skip(client))]
pub async fn me(client: &ApiClient) -> Result<Value> {
    let request = ApiRequest::get("/api/users/me");
    let body = fetch_body(client, request, "Failed to load profile").await?;
    Ok(match body.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => body,
    })
}

#[tracing::instrument(skip(client, preferences))]
pub async fn update_preferences(client: &ApiClient, preferences: Value) -> Result<Value> {
    let request =
        ApiRequest::patch("/api/users/me").with_json(json!({ "preferences": preferences }));
    fetch_body(client, request, "Failed to save preferences").await
}

#[tracing::instrument(skip(client))]
pub async fn reset_preferences(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::delete("/api/users/me/preferences"),
        "Failed to reset preferences",
    )
    .await
}
