use anyhow::Result;
use serde_json::Value;

use super::{fetch_body, fetch_data, fetch_page, segment};
use crate::client::ApiClient;
use crate::http::ApiRequest;

#[tracing::instrument(skip(client))]
pub async fn list(client: &ApiClient) -> Result<Vec<Value>> {
    fetch_page(client, ApiRequest::get("/api/habits"), "Failed to load habits").await
}

#[tracing::instrument(skip(client, habit))]
pub async fn create(client: &ApiClient, habit: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/habits").with_json(habit);
    fetch_data(client, request, "Failed to create habit").await
}

#[tracing::instrument(skip(client, changes))]
pub async fn update(client: &ApiClient, id: &str, changes: Value) -> Result<Value> {
    let request = ApiRequest::patch(format!("/api/habits/{}", segment(id)?)).with_json(changes);
    fetch_data(client, request, "Failed to update habit").await
}

/// Marks the habit done (or not done) for today.
#[tracing::instrument(skip(client))]
pub async fn toggle(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::post(format!("/api/habits/{}/toggle", segment(id)?));
    fetch_data(client, request, "Failed to toggle habit").await
}

#[tracing::instrument(skip(client))]
pub async fn delete(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/habits/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete habit").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_unwraps_paginated_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/habits")
            .match_header("authorization", "Bearer A1")
            .with_status(200)
            .with_body(
                r#"{"success": true, "data": {"data": [{"id": "h1"}, {"id": "h2"}], "pagination": {"page": 1}}}"#,
            )
            .create_async()
            .await;

        let habits = list(&client_for(&server.url())).await.unwrap();

        mock.assert_async().await;
        assert_eq!(habits, vec![json!({"id": "h1"}), json!({"id": "h2"})]);
    }

    #[tokio::test]
    async fn test_list_missing_items_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/habits")
            .with_status(200)
            .with_body(r#"{"success": true, "data": {}}"#)
            .create_async()
            .await;

        let habits = list(&client_for(&server.url())).await.unwrap();
        assert!(habits.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_toggle() {
        let mut server = mockito::Server::new_async().await;
        let create_mock = server
            .mock("POST", "/api/habits")
            .match_body(Matcher::Json(json!({"name": "Read", "frequency": "daily"})))
            .with_status(201)
            .with_body(r#"{"success": true, "data": {"id": "h3", "name": "Read"}}"#)
            .create_async()
            .await;
        let toggle_mock = server
            .mock("POST", "/api/habits/h3/toggle")
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"id": "h3", "completedToday": true}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let created = create(&client, json!({"name": "Read", "frequency": "daily"}))
            .await
            .unwrap();
        let toggled = toggle(&client, "h3").await.unwrap();

        create_mock.assert_async().await;
        toggle_mock.assert_async().await;
        assert_eq!(created["id"], "h3");
        assert_eq!(toggled["completedToday"], true);
    }

    #[tokio::test]
    async fn test_update_failure_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/api/habits/h1")
            .with_status(500)
            .create_async()
            .await;

        let err = update(&client_for(&server.url()), "h1", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to update habit");
    }

    #[tokio::test]
    async fn test_delete_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/habits/h1")
            .with_status(200)
            .with_body(r#"{"success": true, "message": "Habit deleted"}"#)
            .create_async()
            .await;

        let body = delete(&client_for(&server.url()), "h1").await.unwrap();
        assert_eq!(body["message"], "Habit deleted");
    }

    #[tokio::test]
    async fn test_delete_rejects_id_with_path_separator() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = delete(&client_for(&server.url()), "h1/../../users/me")
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Invalid id"));
        mock.assert_async().await;
    }
}
