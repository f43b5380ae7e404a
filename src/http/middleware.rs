//! Request middleware composed into the client when it is built.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use std::sync::Arc;

use super::{ApiRequest, HttpError};
use crate::auth::{AntiForgeryCache, CSRF_HEADER, CredentialStore};

/// One stage of the outgoing request pipeline.
#[async_trait]
pub trait RequestMiddleware: Send + Sync {
    async fn prepare(&self, request: &mut ApiRequest) -> Result<(), HttpError>;
}

/// Ordered list of middleware applied to every outgoing request, including
/// retries.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn RequestMiddleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stage: Arc<dyn RequestMiddleware>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn prepare(&self, request: &mut ApiRequest) -> Result<(), HttpError> {
        for stage in &self.stages {
            stage.prepare(request).await?;
        }
        Ok(())
    }
}

/// Attaches `Authorization: Bearer <token>` when the store holds an access
/// token.
pub struct BearerCredentials {
    store: Arc<dyn CredentialStore>,
}

impl BearerCredentials {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestMiddleware for BearerCredentials {
    async fn prepare(&self, request: &mut ApiRequest) -> Result<(), HttpError> {
        let tokens = self
            .store
            .load()
            .map_err(|e| HttpError::Credentials(format!("{:#}", e)))?;

        let Some(token) = tokens.access else {
            request.headers.remove(AUTHORIZATION);
            return Ok(());
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            HttpError::Credentials("stored access token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Attaches the cached anti-forgery token to state-changing requests,
/// fetching one first when none is cached.
pub struct AntiForgeryHeader {
    cache: Arc<AntiForgeryCache>,
}

impl AntiForgeryHeader {
    pub fn new(cache: Arc<AntiForgeryCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl RequestMiddleware for AntiForgeryHeader {
    async fn prepare(&self, request: &mut ApiRequest) -> Result<(), HttpError> {
        if !request.is_mutating() {
            return Ok(());
        }

        let header = HeaderName::from_static(CSRF_HEADER);
        match self.cache.token().await {
            Some(token) => {
                let value = HeaderValue::from_str(&token).map_err(|_| {
                    HttpError::Decode("anti-forgery token is not a valid header value".to_string())
                })?;
                request.headers.insert(header, value);
            }
            None => {
                debug!(
                    "No anti-forgery token available for {} {}",
                    request.method, request.path
                );
                request.headers.remove(header);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MockCredentialStore, TokenPair};
    use crate::http::{ApiResponse, MockTransport};
    use serde_json::json;

    fn store_with(access: Option<&str>) -> Arc<dyn CredentialStore> {
        let access = access.map(str::to_string);
        let mut store = MockCredentialStore::new();
        store.expect_load().returning(move || {
            Ok(TokenPair {
                access: access.clone(),
                refresh: None,
            })
        });
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_bearer_attaches_token() {
        let stage = BearerCredentials::new(store_with(Some("A1")));
        let mut request = ApiRequest::get("/api/habits");

        stage.prepare(&mut request).await.unwrap();

        let value = request.headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer A1");
        assert!(value.is_sensitive());
    }

    #[tokio::test]
    async fn test_bearer_without_token_leaves_no_header() {
        let stage = BearerCredentials::new(store_with(None));
        let mut request = ApiRequest::get("/api/habits");
        request
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));

        stage.prepare(&mut request).await.unwrap();

        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_bearer_store_failure() {
        let mut store = MockCredentialStore::new();
        store
            .expect_load()
            .returning(|| Err(anyhow::anyhow!("permission denied")));
        let stage = BearerCredentials::new(Arc::new(store));

        let result = stage.prepare(&mut ApiRequest::get("/")).await;
        assert!(matches!(result, Err(HttpError::Credentials(_))));
    }

    #[tokio::test]
    async fn test_anti_forgery_skips_safe_methods() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let cache = Arc::new(AntiForgeryCache::new(Arc::new(transport)));
        let stage = AntiForgeryHeader::new(cache);

        let mut request = ApiRequest::get("/api/habits");
        stage.prepare(&mut request).await.unwrap();

        assert!(request.headers.get(CSRF_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_anti_forgery_fetches_once_then_caches() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/api/csrf-token")
            .times(1)
            .returning(|_| Ok(ApiResponse::ok(json!({"csrfToken": "X"}))));
        let cache = Arc::new(AntiForgeryCache::new(Arc::new(transport)));
        let stage = AntiForgeryHeader::new(cache);

        for _ in 0..2 {
            let mut request = ApiRequest::post("/api/habits");
            stage.prepare(&mut request).await.unwrap();
            assert_eq!(request.headers.get(CSRF_HEADER).unwrap(), "X");
        }
    }

    #[tokio::test]
    async fn test_pipeline_runs_stages_in_order() {
        let pipeline = Pipeline::new().with(Arc::new(BearerCredentials::new(store_with(Some(
            "first",
        )))));
        let pipeline = pipeline.with(Arc::new(BearerCredentials::new(store_with(Some("second")))));
        assert_eq!(pipeline.len(), 2);

        let mut request = ApiRequest::get("/");
        pipeline.prepare(&mut request).await.unwrap();

        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Bearer second");
    }
}
