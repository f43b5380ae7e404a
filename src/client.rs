//! The authenticated API client.
//!
//! Every call goes through the middleware pipeline (credentials, anti-forgery
//! token) and then the transport. Two failure classes are recovered from
//! locally, each at most once per call:
//!
//! - 401 with an expired/invalid token message: the session is refreshed once
//!   for all concurrent callers, then each caller replays its own request.
//! - 403 with a CSRF message: the anti-forgery token is refetched and the
//!   request replayed.
//!
//! Everything else is returned to the caller unchanged.

use anyhow::Result;
use log::{debug, info, warn};
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::auth::{
    AntiForgeryCache, AuthMode, CookieSessionStore, CredentialStore, FileCredentialStore,
    LOGIN_ROUTE, LogSessionListener, MemoryCredentialStore, REFRESH_PATH, RecoveryError,
    SessionListener, TokenPair, parse_token_pair,
};
use crate::config::ClientConfig;
use crate::http::{
    AntiForgeryHeader, ApiRequest, ApiResponse, BearerCredentials, FailureClass,
    FixtureTransport, HttpError, Pipeline, ReqwestTransport, SingleFlight, Transport, classify,
};
use crate::runtime::Runtime;

struct ClientInner {
    mode: AuthMode,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    csrf: Arc<AntiForgeryCache>,
    pipeline: Pipeline,
    session: SingleFlight<Result<(), RecoveryError>>,
    signed_out: AtomicBool,
    listener: Arc<dyn SessionListener>,
    login_route: String,
}

/// Cheap to clone; clones share credentials, the anti-forgery cache and the
/// in-flight session refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

pub struct ApiClientBuilder {
    mode: AuthMode,
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn CredentialStore>>,
    listener: Arc<dyn SessionListener>,
    login_route: String,
    anti_forgery: bool,
}

impl ApiClientBuilder {
    pub fn mode(mut self, mode: AuthMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Whether cookie mode attaches the anti-forgery header. Fixture
    /// transports have no token endpoint, so they turn it off.
    pub fn anti_forgery(mut self, enabled: bool) -> Self {
        self.anti_forgery = enabled;
        self
    }

    /// Composes the request pipeline for the selected mode: bearer mode
    /// attaches the stored access token, cookie mode attaches the
    /// anti-forgery token to state-changing requests.
    pub fn build(self) -> ApiClient {
        let store: Arc<dyn CredentialStore> = match (self.store, self.mode) {
            (Some(store), _) => store,
            (None, AuthMode::Bearer) => Arc::new(MemoryCredentialStore::new()),
            (None, AuthMode::Cookie) => Arc::new(CookieSessionStore),
        };
        let csrf = Arc::new(AntiForgeryCache::new(Arc::clone(&self.transport)));

        let pipeline = match self.mode {
            AuthMode::Bearer => {
                Pipeline::new().with(Arc::new(BearerCredentials::new(Arc::clone(&store))))
            }
            AuthMode::Cookie if self.anti_forgery => Pipeline::new().with(Arc::new(
                AntiForgeryHeader::new(Arc::clone(&csrf)),
            )),
            AuthMode::Cookie => Pipeline::new(),
        };

        ApiClient {
            inner: Arc::new(ClientInner {
                mode: self.mode,
                transport: self.transport,
                store,
                csrf,
                pipeline,
                session: SingleFlight::new(),
                signed_out: AtomicBool::new(false),
                listener: self.listener,
                login_route: self.login_route,
            }),
        }
    }
}

impl ApiClient {
    pub fn builder(transport: Arc<dyn Transport>) -> ApiClientBuilder {
        ApiClientBuilder {
            mode: AuthMode::default(),
            transport,
            store: None,
            listener: Arc::new(LogSessionListener),
            login_route: LOGIN_ROUTE.to_string(),
            anti_forgery: true,
        }
    }

    /// Builds the client described by `config`: fixture or network transport,
    /// file-backed credentials in bearer mode, a cookie jar in cookie mode.
    #[tracing::instrument(skip(config, runtime, listener))]
    pub fn from_config<R>(
        config: &ClientConfig,
        runtime: R,
        listener: Arc<dyn SessionListener>,
    ) -> Result<Self>
    where
        R: Runtime + Clone + 'static,
    {
        let transport: Arc<dyn Transport> = if config.use_mocks {
            info!("Using static fixtures from {:?}", config.fixture_dir);
            Arc::new(FixtureTransport::new(runtime.clone(), &config.fixture_dir))
        } else {
            Arc::new(ReqwestTransport::build(
                &config.base_url,
                config.auth_mode == AuthMode::Cookie,
            )?)
        };

        let store: Arc<dyn CredentialStore> = match config.auth_mode {
            AuthMode::Bearer => Arc::new(FileCredentialStore::new(
                runtime,
                &config.credentials_path,
            )),
            AuthMode::Cookie => Arc::new(CookieSessionStore),
        };

        Ok(Self::builder(transport)
            .mode(config.auth_mode)
            .credential_store(store)
            .session_listener(listener)
            .login_route(&config.login_route)
            .anti_forgery(!config.use_mocks)
            .build())
    }

    pub fn mode(&self) -> AuthMode {
        self.inner.mode
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn anti_forgery(&self) -> &AntiForgeryCache {
        &self.inner.csrf
    }

    /// True after a failed refresh or an explicit sign-out, until a new
    /// session is established.
    pub fn is_signed_out(&self) -> bool {
        self.inner.signed_out.load(Ordering::SeqCst)
    }

    /// Performs `method path` with an optional JSON body and query parameters.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        params: &[(String, String)],
    ) -> Result<ApiResponse, HttpError> {
        let mut request = ApiRequest::new(method, path).with_params(params);
        request.body = body;
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, HttpError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<ApiResponse, HttpError> {
        self.request(Method::POST, path, body, &[]).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse, HttpError> {
        self.send(ApiRequest::patch(path).with_json(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse, HttpError> {
        self.send(ApiRequest::put(path).with_json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, HttpError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Sends `request`, recovering from an expired session or a rejected
    /// anti-forgery token at most once each.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, HttpError> {
        if !request.is_supported_method() {
            return Err(HttpError::UnsupportedMethod(request.method));
        }

        loop {
            let error = match self.inner.send_once(&request).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            let replay = match classify(&error) {
                FailureClass::AntiForgeryRejected => {
                    self.inner.recover_anti_forgery(&mut request).await
                }
                FailureClass::SessionExpired if !request.session_retried => {
                    request.session_retried = true;
                    debug!("Session expired for {} {}", request.method, request.path);
                    match self.recover_session().await {
                        Ok(()) => true,
                        Err(e) => {
                            debug!("Not retrying {} {}: {}", request.method, request.path, e);
                            false
                        }
                    }
                }
                _ => false,
            };
            if !replay {
                return Err(error);
            }

            debug!("Retrying {} {}", request.method, request.path);
        }
    }

    /// Refreshes the session after a 401. Short-circuits once the session is
    /// signed out; otherwise joins or starts the shared refresh.
    async fn recover_session(&self) -> Result<(), RecoveryError> {
        if self.is_signed_out() {
            debug!("Session is signed out; skipping refresh");
            return Err(RecoveryError::signed_out());
        }
        self.refresh_session().await
    }

    /// Refreshes the session now, joining a refresh that is already running.
    pub async fn refresh_session(&self) -> Result<(), RecoveryError> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .session
            .run(move || async move { inner.refresh().await })
            .await
    }

    /// Stores a freshly issued token pair and leaves the signed-out state.
    pub fn establish_session(&self, tokens: &TokenPair) -> Result<(), HttpError> {
        self.inner
            .store
            .save(tokens)
            .map_err(|e| HttpError::Credentials(format!("{:#}", e)))?;
        self.inner.signed_out.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Forgets local credentials and the cached anti-forgery token. Until a
    /// new session is established, 401s are not refreshed.
    pub fn end_session(&self) -> Result<(), HttpError> {
        self.inner.csrf.clear();
        self.inner.signed_out.store(true, Ordering::SeqCst);
        self.inner
            .store
            .clear()
            .map_err(|e| HttpError::Credentials(format!("{:#}", e)))
    }
}

impl ClientInner {
    /// One pass through the pipeline and the transport, without recovery.
    async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        let mut outgoing = request.clone();
        self.pipeline.prepare(&mut outgoing).await?;
        self.transport.send(&outgoing).await?.into_result()
    }

    /// Refetches the anti-forgery token after a rejection. Returns whether
    /// the request may be replayed; each request gets one refetch.
    async fn recover_anti_forgery(&self, request: &mut ApiRequest) -> bool {
        if request.csrf_retried {
            return false;
        }
        request.csrf_retried = true;
        debug!("CSRF token rejected for {} {}", request.method, request.path);
        self.csrf.fetch().await;
        true
    }

    /// Like [`ApiClient::send`] but a 401 is final. The refresh call goes
    /// through here so it can never start another refresh.
    async fn send_without_session_recovery(
        &self,
        mut request: ApiRequest,
    ) -> Result<ApiResponse, HttpError> {
        loop {
            let error = match self.send_once(&request).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            if classify(&error) == FailureClass::AntiForgeryRejected
                && self.recover_anti_forgery(&mut request).await
            {
                debug!("Retrying {} {}", request.method, request.path);
                continue;
            }
            return Err(error);
        }
    }

    async fn refresh(&self) -> Result<(), RecoveryError> {
        info!("Refreshing session");

        match self.try_refresh().await {
            Ok(()) => {
                self.signed_out.store(false, Ordering::SeqCst);
                info!("Session refreshed");
                Ok(())
            }
            Err(e) => {
                warn!("{}", e);
                self.sign_out();
                Err(e)
            }
        }
    }

    async fn try_refresh(&self) -> Result<(), RecoveryError> {
        let request = match self.mode {
            AuthMode::Bearer => {
                let tokens = self
                    .store
                    .load()
                    .map_err(|e| RecoveryError::new(format!("{:#}", e)))?;
                let refresh = tokens
                    .refresh
                    .ok_or_else(|| RecoveryError::new("no refresh token stored"))?;
                ApiRequest::post(REFRESH_PATH).with_json(json!({ "refreshToken": refresh }))
            }
            // the server reads the refresh cookie
            AuthMode::Cookie => ApiRequest::post(REFRESH_PATH),
        };

        let response = self.send_without_session_recovery(request).await?;

        if self.mode == AuthMode::Bearer {
            let previous = self.store.load().unwrap_or_else(|e| {
                warn!("Failed to read stored credentials: {:#}", e);
                TokenPair::default()
            });
            let mut tokens = parse_token_pair(&response.body)
                .ok_or_else(|| RecoveryError::new("refresh response has no token"))?;
            if tokens.refresh.is_none() {
                tokens.refresh = previous.refresh;
            }
            self.store
                .save(&tokens)
                .map_err(|e| RecoveryError::new(format!("{:#}", e)))?;
        }
        Ok(())
    }

    fn sign_out(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear credentials: {:#}", e);
        }
        self.csrf.clear();
        self.signed_out.store(true, Ordering::SeqCst);
        self.listener.on_signed_out(&self.login_route);
    }
}
