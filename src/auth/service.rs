//! Sign-in, registration, refresh and sign-out on top of [`ApiClient`].

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use super::{AuthMode, TokenPair, parse_token_pair};
use crate::api::format_error;
use crate::client::ApiClient;
use crate::http::ApiRequest;

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const LOGOUT_PATH: &str = "/api/auth/logout";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// The signed-in user as returned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Value,
    pub tokens: TokenPair,
}

#[tracing::instrument(skip(client, credentials), fields(email = %credentials.email))]
pub async fn login(client: &ApiClient, credentials: &LoginRequest) -> Result<Session> {
    let body = serde_json::to_value(credentials)?;
    authenticate(client, LOGIN_PATH, body, "Login failed").await
}

#[tracing::instrument(skip(client, payload), fields(email = %payload.email))]
pub async fn register(client: &ApiClient, payload: &RegisterRequest) -> Result<Session> {
    let body = serde_json::to_value(payload)?;
    authenticate(client, REGISTER_PATH, body, "Registration failed").await
}

async fn authenticate(
    client: &ApiClient,
    path: &str,
    body: Value,
    fallback: &str,
) -> Result<Session> {
    let response = client
        .send(ApiRequest::post(path).with_json(body))
        .await
        .map_err(|e| format_error(e, fallback))?;

    let source = match response.body.get("token") {
        Some(_) => &response.body,
        None => response.data(),
    };
    let user = source.get("user").cloned().unwrap_or(Value::Null);

    let tokens = match (client.mode(), parse_token_pair(&response.body)) {
        (_, Some(tokens)) => tokens,
        (AuthMode::Cookie, None) => TokenPair::default(),
        (AuthMode::Bearer, None) => return Err(anyhow!("{}: response has no token", fallback)),
    };

    client
        .establish_session(&tokens)
        .context("Failed to store credentials")?;
    info!("Signed in");

    Ok(Session { user, tokens })
}

/// Refreshes the session explicitly. Returns whether it succeeded; a failed
/// refresh leaves the client signed out.
#[tracing::instrument(skip(client))]
pub async fn refresh(client: &ApiClient) -> bool {
    match client.refresh_session().await {
        Ok(()) => true,
        Err(e) => {
            debug!("Explicit refresh failed: {}", e);
            false
        }
    }
}

/// Ends the session. In cookie mode the server is asked to drop its cookies;
/// a failure there is logged and local state is cleared anyway.
#[tracing::instrument(skip(client))]
pub async fn logout(client: &ApiClient) -> Result<()> {
    if client.mode() == AuthMode::Cookie
        && let Err(e) = client.post(LOGOUT_PATH, None).await
    {
        warn!("Server-side logout failed: {}", e);
    }

    client.end_session().context("Failed to clear credentials")?;
    info!("Signed out");
    Ok(())
}

/// Bearer mode: an access token is stored. Cookie mode: no refresh has failed
/// since the session was established.
pub fn is_authenticated(client: &ApiClient) -> Result<bool> {
    match client.mode() {
        AuthMode::Bearer => Ok(client.credentials().load()?.access.is_some()),
        AuthMode::Cookie => Ok(!client.is_signed_out()),
    }
}
