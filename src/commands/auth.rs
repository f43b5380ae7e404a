use anyhow::{Result, bail};
use log::debug;
use serde_json::json;

use crate::auth::service::{self, LoginRequest, RegisterRequest, Session};
use crate::client::ApiClient;

use super::{LOGIN_HINT, print_json};

fn print_session(session: &Session) {
    print_json(&json!({ "user": session.user }));
}

#[tracing::instrument(skip(client, password))]
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<()> {
    let credentials = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    let session = service::login(client, &credentials).await?;
    print_session(&session);
    Ok(())
}

#[tracing::instrument(skip(client, password))]
pub async fn register(client: &ApiClient, name: &str, email: &str, password: &str) -> Result<()> {
    let payload = RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    let session = service::register(client, &payload).await?;
    print_session(&session);
    Ok(())
}

#[tracing::instrument(skip(client))]
pub async fn logout(client: &ApiClient) -> Result<()> {
    service::logout(client).await?;
    println!("Signed out.");
    Ok(())
}

#[tracing::instrument(skip(client))]
pub async fn refresh(client: &ApiClient) -> Result<()> {
    if !service::refresh(client).await {
        debug!("Refresh rejected");
        bail!("Session refresh failed. {}", LOGIN_HINT);
    }
    println!("Session refreshed.");
    Ok(())
}
