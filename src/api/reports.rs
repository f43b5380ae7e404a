use anyhow::Result;
use serde_json::Value;

use super::fetch_data;
use crate::client::ApiClient;
use crate::http::ApiRequest;

#[tracing::instrument(skip(client))]
pub async fn today(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/reports/today"),
        "Failed to load today's report",
    )
    .await
}

#[tracing::instrument(skip(client, report))]
pub async fn post_daily(client: &ApiClient, report: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/reports").with_json(report);
    fetch_data(client, request, "Failed to save report").await
}

/// Reports in a date range, passed through as query parameters.
#[tracing::instrument(skip(client))]
pub async fn list(client: &ApiClient, range: &[(String, String)]) -> Result<Value> {
    let request = ApiRequest::get("/api/reports").with_params(range);
    fetch_data(client, request, "Failed to load reports").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_today() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/reports/today")
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"tasksCompleted": 4}}"#)
            .create_async()
            .await;

        let report = today(&client_for(&server.url())).await.unwrap();
        assert_eq!(report["tasksCompleted"], 4);
    }

    #[tokio::test]
    async fn test_list_passes_range() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/reports")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("to".into(), "2024-01-31".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success": true, "data": []}"#)
            .create_async()
            .await;

        let range = vec![
            ("from".to_string(), "2024-01-01".to_string()),
            ("to".to_string(), "2024-01-31".to_string()),
        ];
        list(&client_for(&server.url()), &range).await.unwrap();

        mock.assert_async().await;
    }
}
