//! Credential storage, anti-forgery tokens and session lifecycle.

mod csrf;
mod session;
mod store;

pub mod service;

pub use csrf::{AntiForgeryCache, CSRF_HEADER, CSRF_TOKEN_PATH};
pub use session::{
    LOGIN_ROUTE, LogSessionListener, REFRESH_PATH, RecoveryError, SessionListener,
    parse_token_pair,
};
pub use store::{
    CookieSessionStore, CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenPair,
};

#[cfg(test)]
pub use store::MockCredentialStore;

pub use crate::config::AuthMode;
