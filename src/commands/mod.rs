use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::auth::SessionListener;

pub mod auth;
pub mod request;
pub mod resources;

pub use auth::{login, logout, refresh, register};
pub use request::request;

pub const LOGIN_HINT: &str = "Your session has ended. Run `aura login` to sign in again.";

/// Prints the signed-out hint on stderr so stdout stays valid JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliSessionListener;

impl SessionListener for CliSessionListener {
    fn on_signed_out(&self, login_route: &str) {
        log::debug!("Signed out, login route {}", login_route);
        eprintln!("{}", LOGIN_HINT);
    }
}

pub(crate) fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn print_json(value: &Value) {
    println!("{}", render_json(value));
}

/// Parses a `key=value` query parameter given on the command line.
pub fn parse_param(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid parameter '{}', expected key=value", raw))?;
    if key.is_empty() {
        return Err(anyhow!("Invalid parameter '{}', key is empty", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("from=2024-01-01").unwrap(),
            ("from".to_string(), "2024-01-01".to_string())
        );
        // Only the first '=' separates key and value
        assert_eq!(
            parse_param("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_param("empty=").unwrap().1, "");
    }

    #[test]
    fn test_parse_param_rejects_malformed() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_render_json_is_pretty() {
        let rendered = render_json(&json!({"a": 1}));
        assert_eq!(rendered, "{\n  \"a\": 1\n}");
    }
}
