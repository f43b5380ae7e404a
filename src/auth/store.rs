use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::runtime::Runtime;

/// Access and refresh token pair, persisted under the `token` and
/// `refreshToken` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Some(access.into()),
            refresh: Some(refresh.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

/// Where session credentials live between requests.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<TokenPair>;
    fn save(&self, tokens: &TokenPair) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Keeps the pair in memory only; useful for library callers and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: Mutex<TokenPair>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(tokens),
        }
    }

    fn tokens(&self) -> std::sync::MutexGuard<'_, TokenPair> {
        self.tokens.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<TokenPair> {
        Ok(self.tokens().clone())
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        *self.tokens() = tokens.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.tokens() = TokenPair::default();
        Ok(())
    }
}

/// Persists the pair as a small JSON file.
pub struct FileCredentialStore<R: Runtime> {
    runtime: R,
    path: PathBuf,
}

impl<R: Runtime> FileCredentialStore<R> {
    pub fn new(runtime: R, path: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            path: path.into(),
        }
    }
}

impl<R: Runtime> CredentialStore for FileCredentialStore<R> {
    #[tracing::instrument(skip(self))]
    fn load(&self) -> Result<TokenPair> {
        if !self.runtime.exists(&self.path) {
            return Ok(TokenPair::default());
        }

        let content = self
            .runtime
            .read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {:?}", self.path))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file {:?}", self.path))
    }

    #[tracing::instrument(skip(self, tokens))]
    fn save(&self, tokens: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.runtime.create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(tokens)?;
        self.runtime
            .write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to write credentials to {:?}", self.path))?;

        debug!("Saved credentials to {:?}", self.path);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        if self.runtime.exists(&self.path) {
            self.runtime
                .remove_file(&self.path)
                .with_context(|| format!("Failed to remove credentials file {:?}", self.path))?;
            debug!("Removed credentials file {:?}", self.path);
        }
        Ok(())
    }
}

/// Cookie mode: the session lives in HttpOnly cookies owned by the transport,
/// so there is nothing for client code to read or write.
#[derive(Debug, Default, Clone, Copy)]
pub struct CookieSessionStore;

impl CredentialStore for CookieSessionStore {
    fn load(&self) -> Result<TokenPair> {
        Ok(TokenPair::default())
    }

    fn save(&self, _tokens: &TokenPair) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}
