use log::{debug, warn};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::http::{ApiRequest, SingleFlight, Transport};

pub const CSRF_TOKEN_PATH: &str = "/api/csrf-token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// In-memory anti-forgery token, fetched lazily and never persisted.
pub struct AntiForgeryCache {
    transport: Arc<dyn Transport>,
    token: Arc<Mutex<Option<String>>>,
    fetch: SingleFlight<Option<String>>,
}

impl AntiForgeryCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: Arc::new(Mutex::new(None)),
            fetch: SingleFlight::new(),
        }
    }

    pub fn cached(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    /// The cached token, or a freshly fetched one.
    pub async fn token(&self) -> Option<String> {
        match self.cached() {
            Some(token) => Some(token),
            None => self.fetch().await,
        }
    }

    /// Fetches a new token from the server and caches it. Concurrent callers
    /// share one fetch. A failed fetch is logged and yields `None`.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self) -> Option<String> {
        let transport = Arc::clone(&self.transport);
        let slot = Arc::clone(&self.token);

        self.fetch
            .run(move || async move {
                let token = match request_token(transport.as_ref()).await {
                    Ok(token) => Some(token),
                    Err(e) => {
                        warn!("Failed to fetch CSRF token: {}", e);
                        None
                    }
                };
                *lock(&slot) = token.clone();
                token
            })
            .await
    }

    pub fn clear(&self) {
        debug!("Dropping cached CSRF token");
        *lock(&self.token) = None;
    }
}

async fn request_token(transport: &dyn Transport) -> Result<String, String> {
    let response = transport
        .send(&ApiRequest::get(CSRF_TOKEN_PATH))
        .await
        .and_then(|r| r.into_result())
        .map_err(|e| e.to_string())?;

    let body = &response.body;
    body.get("csrfToken")
        .or_else(|| body.get("data").and_then(|d| d.get("csrfToken")))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| "response has no csrfToken".to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}
