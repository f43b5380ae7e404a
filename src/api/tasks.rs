use anyhow::Result;
use serde_json::{Value, json};

use super::{fetch_body, fetch_data, segment};
use crate::client::ApiClient;
use crate::http::ApiRequest;

/// Tasks scheduled between `from` and `to` (ISO dates), both optional.
#[tracing::instrument(skip(client))]
pub async fn list(client: &ApiClient, from: Option<&str>, to: Option<&str>) -> Result<Value> {
    let request = ApiRequest::get("/api/tasks")
        .with_optional_param("from", from)
        .with_optional_param("to", to);
    let data = fetch_data(client, request, "Failed to load tasks").await?;
    Ok(match data {
        Value::Null => Value::Array(Vec::new()),
        data => data,
    })
}

#[tracing::instrument(skip(client, task))]
pub async fn create(client: &ApiClient, task: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/tasks").with_json(task);
    fetch_data(client, request, "Failed to create task").await
}

#[tracing::instrument(skip(client, changes))]
pub async fn update(client: &ApiClient, id: &str, changes: Value) -> Result<Value> {
    let request = ApiRequest::patch(format!("/api/tasks/{}", segment(id)?)).with_json(changes);
    fetch_data(client, request, "Failed to update task").await
}

/// Reschedules a task on the calendar.
#[tracing::instrument(skip(client))]
pub async fn move_to(
    client: &ApiClient,
    id: &str,
    start_time: &str,
    end_time: &str,
) -> Result<Value> {
    let request = ApiRequest::patch(format!("/api/tasks/{}/move", segment(id)?))
        .with_json(json!({ "startTime": start_time, "endTime": end_time }));
    fetch_data(client, request, "Failed to move task").await
}

#[tracing::instrument(skip(client))]
pub async fn complete(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::post(format!("/api/tasks/{}/complete", segment(id)?));
    fetch_data(client, request, "Failed to complete task").await
}

#[tracing::instrument(skip(client))]
pub async fn delete(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/tasks/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete task").await
}
