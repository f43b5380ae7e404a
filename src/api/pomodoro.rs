use anyhow::Result;
use serde_json::{Value, json};

use super::{fetch_data, segment};
use crate::client::ApiClient;
use crate::http::ApiRequest;

/// Starts a focus session, optionally tied to a task.
#[tracing::instrument(skip(client))]
pub async fn start(client: &ApiClient, task_id: Option<&str>) -> Result<Value> {
    let request = ApiRequest::post("/api/pomodoro/start").with_json(json!({ "taskId": task_id }));
    fetch_data(client, request, "Failed to start session").await
}

/// Ends a session after `duration` seconds.
#[tracing::instrument(skip(client))]
pub async fn finish(
    client: &ApiClient,
    session_id: &str,
    duration: u64,
    completed: bool,
) -> Result<Value> {
    let request = ApiRequest::post(format!("/api/pomodoro/{}/finish", segment(session_id)?))
        .with_json(json!({ "duration": duration, "completed": completed }));
    fetch_data(client, request, "Failed to finish session").await
}

#[tracing::instrument(skip(client))]
pub async fn stats(client: &ApiClient, from: Option<&str>, to: Option<&str>) -> Result<Value> {
    let request = ApiRequest::get("/api/pomodoro/stats")
        .with_optional_param("from", from)
        .with_optional_param("to", to);
    fetch_data(client, request, "Failed to load pomodoro stats").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_start_and_finish() {
        let mut server = mockito::Server::new_async().await;
        let start_mock = server
            .mock("POST", "/api/pomodoro/start")
            .match_body(Matcher::Json(json!({"taskId": "t1"})))
            .with_status(201)
            .with_body(r#"{"success": true, "data": {"id": "p1"}}"#)
            .create_async()
            .await;
        let finish_mock = server
            .mock("POST", "/api/pomodoro/p1/finish")
            .match_body(Matcher::Json(json!({"duration": 1500, "completed": true})))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"id": "p1", "completed": true}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let session = start(&client, Some("t1")).await.unwrap();
        let finished = finish(&client, session["id"].as_str().unwrap(), 1500, true)
            .await
            .unwrap();

        start_mock.assert_async().await;
        finish_mock.assert_async().await;
        assert_eq!(finished["completed"], true);
    }

    #[tokio::test]
    async fn test_stats_range() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/pomodoro/stats")
            .match_query(Matcher::UrlEncoded("from".into(), "2024-01-01".into()))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"totalMinutes": 300}}"#)
            .create_async()
            .await;

        let data = stats(&client_for(&server.url()), Some("2024-01-01"), None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(data["totalMinutes"], 300);
    }
}
