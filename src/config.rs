use anyhow::{Context, Result, bail};
use log::debug;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::LOGIN_ROUTE;
use crate::runtime::Runtime;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_FIXTURE_DIR: &str = "data";

const ENV_API_URL: &str = "AURA_API_URL";
const ENV_AUTH_MODE: &str = "AURA_AUTH_MODE";
const ENV_USE_MOCKS: &str = "AURA_USE_MOCKS";
const ENV_FIXTURE_DIR: &str = "AURA_FIXTURE_DIR";
const ENV_CREDENTIALS: &str = "AURA_CREDENTIALS";

/// How the session credential travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Access/refresh pair held by the client, sent as `Authorization`.
    #[default]
    Bearer,
    /// HttpOnly cookies held by the transport, plus an anti-forgery header.
    Cookie,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(AuthMode::Bearer),
            "cookie" => Ok(AuthMode::Cookie),
            other => bail!("Unknown auth mode '{}', expected 'bearer' or 'cookie'", other),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Bearer => write!(f, "bearer"),
            AuthMode::Cookie => write!(f, "cookie"),
        }
    }
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub auth_mode: Option<AuthMode>,
    pub use_mocks: bool,
    pub fixture_dir: Option<PathBuf>,
    pub credentials: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_mode: AuthMode,
    pub use_mocks: bool,
    pub fixture_dir: PathBuf,
    pub credentials_path: PathBuf,
    pub login_route: String,
}

impl ClientConfig {
    #[tracing::instrument(skip(runtime, overrides))]
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let env = |key: &str| runtime.env_var(key).ok().filter(|v| !v.trim().is_empty());

        let base_url = overrides
            .api_url
            .or_else(|| env(ENV_API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let auth_mode = match overrides.auth_mode {
            Some(mode) => mode,
            None => env(ENV_AUTH_MODE)
                .map(|v| v.parse::<AuthMode>())
                .transpose()
                .with_context(|| format!("Invalid {}", ENV_AUTH_MODE))?
                .unwrap_or_default(),
        };

        let use_mocks = overrides.use_mocks
            || env(ENV_USE_MOCKS).is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let fixture_dir = overrides
            .fixture_dir
            .or_else(|| env(ENV_FIXTURE_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_DIR));

        let credentials_path = match overrides
            .credentials
            .or_else(|| env(ENV_CREDENTIALS).map(PathBuf::from))
        {
            Some(path) => path,
            None => runtime
                .config_dir()
                .context("Could not determine the config directory; set AURA_CREDENTIALS")?
                .join("aura")
                .join("credentials.json"),
        };

        let config = Self {
            base_url,
            auth_mode,
            use_mocks,
            fixture_dir,
            credentials_path,
            login_route: LOGIN_ROUTE.to_string(),
        };
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }
}
