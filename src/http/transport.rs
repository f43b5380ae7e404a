//! Transports that carry an [`ApiRequest`] to the backend.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::{ApiRequest, ApiResponse, HttpError};

pub const USER_AGENT: &str = concat!("aura-cli/", env!("AURA_VERSION"));

/// Sends one request and reports the raw response. A non-success status is
/// still `Ok`; the client decides what to do with it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError>;
}

/// Transport backed by a reqwest [`Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Requests go to `base_url` joined with the request path; a trailing
    /// slash on the base is dropped.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Builds a client for `base_url`. With `cookie_store` the client keeps the
    /// server's session cookies and sends them back on every request.
    pub fn build(base_url: impl Into<String>, cookie_store: bool) -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(cookie_store)
            .build()
            .map_err(HttpError::Transport)?;
        Ok(Self::new(client, base_url))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("{} {}...", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(HttpError::Transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(HttpError::Transport)?;

        debug!("{} {} -> {}", request.method, url, status.as_u16());

        Ok(ApiResponse::new(status, ApiResponse::decode_body(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_get_with_query() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/api/tasks")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("to".into(), "2024-01-07".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "data": []}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Client::new(), server.url());
        let request = ApiRequest::get("/api/tasks")
            .with_param("from", "2024-01-01")
            .with_param("to", "2024-01-07");

        let response = transport.send(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data(), &json!([]));
    }

    #[tokio::test]
    async fn test_send_post_json_body() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/api/habits")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "Stretch"})))
            .with_status(201)
            .with_body(r#"{"success": true, "data": {"id": "h1"}}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Client::new(), format!("{}/", server.url()));
        let request = ApiRequest::post("/api/habits").with_json(json!({"name": "Stretch"}));

        let response = transport.send(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.data()["id"], "h1");
    }

    #[tokio::test]
    async fn test_send_reports_error_status_as_response() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("DELETE", "/api/habits/9")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Client::new(), server.url());
        let response = transport
            .send(&ApiRequest::delete("/api/habits/9"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!("Not Found"));
    }

    #[tokio::test]
    async fn test_build_sets_user_agent() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", Matcher::Regex("^aura-cli/".to_string()))
            .with_status(204)
            .create_async()
            .await;

        let transport = ReqwestTransport::build(server.url(), false).unwrap();
        let response = transport.send(&ApiRequest::get("/")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.body, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_send_connection_failure() {
        // Nothing listens on port 9 on a test host.
        let transport = ReqwestTransport::new(Client::new(), "http://127.0.0.1:9");
        let result = transport.send(&ApiRequest::get("/api/habits")).await;
        assert!(matches!(result, Err(HttpError::Transport(_))));
    }
}
