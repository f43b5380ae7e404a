//! Static-mock transport for local development without a backend.

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{ApiRequest, ApiResponse, HttpError, Transport};
use crate::runtime::Runtime;

/// Collection routes served straight from JSON files.
const FIXTURE_FILES: &[(&str, &str)] = &[
    ("/api/tasks", "tasks.json"),
    ("/api/habits", "habits.json"),
    ("/api/reports", "reports.json"),
];

const ME_PATH: &str = "/api/users/me";
const PREFERENCES_PATH: &str = "/api/users/me/preferences";
const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PomodoroPreferences {
    work: u32,
    short_break: u32,
    long_break: u32,
}

impl Default for PomodoroPreferences {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Preferences {
    theme: String,
    pomodoro: PomodoroPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            pomodoro: PomodoroPreferences::default(),
        }
    }
}

/// Answers a handful of routes from files under `dir`; everything else fails.
pub struct FixtureTransport<R: Runtime> {
    runtime: R,
    dir: PathBuf,
}

impl<R: Runtime> FixtureTransport<R> {
    pub fn new(runtime: R, dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            dir: dir.into(),
        }
    }

    fn not_found(method: &Method, path: &str) -> HttpError {
        HttpError::Fixture(format!("Mock {} not found for {}", method, path))
    }

    fn fixture_error(e: anyhow::Error) -> HttpError {
        HttpError::Fixture(format!("{:#}", e))
    }

    fn serve_file(&self, file: &str) -> Result<ApiResponse, HttpError> {
        let path = self.dir.join(file);
        let content = self
            .runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read fixture {:?}", path))
            .map_err(Self::fixture_error)?;
        let body = serde_json::from_str(&content)
            .with_context(|| format!("Fixture {:?} is not valid JSON", path))
            .map_err(Self::fixture_error)?;
        Ok(ApiResponse::ok(body))
    }

    fn load_preferences(&self) -> Result<Preferences, HttpError> {
        let path = self.dir.join(PREFERENCES_FILE);
        if !self.runtime.exists(&path) {
            return Ok(Preferences::default());
        }
        let content = self
            .runtime
            .read_to_string(&path)
            .map_err(Self::fixture_error)?;
        serde_json::from_str(&content).map_err(|e| HttpError::Decode(e.to_string()))
    }

    fn store_preferences(&self, preferences: &Preferences) -> Result<(), HttpError> {
        let json = serde_json::to_string_pretty(preferences)
            .map_err(|e| HttpError::Decode(e.to_string()))?;
        self.runtime
            .write(&self.dir.join(PREFERENCES_FILE), json.as_bytes())
            .map_err(Self::fixture_error)
    }

    fn me(&self) -> Result<ApiResponse, HttpError> {
        let preferences = self.load_preferences()?;
        Ok(ApiResponse::ok(json!({
            "id": "me",
            "name": "Mock User",
            "preferences": preferences,
        })))
    }

    fn update_preferences(&self, body: Option<&Value>) -> Result<ApiResponse, HttpError> {
        let mut preferences = self.load_preferences()?;
        let patch = body
            .and_then(|b| b.get("preferences"))
            .cloned()
            .unwrap_or(Value::Null);

        if let Some(theme) = patch.get("theme").and_then(Value::as_str) {
            preferences.theme = theme.to_string();
        }
        if let Some(pomodoro) = patch.get("pomodoro") {
            let minutes = |key: &str| {
                pomodoro
                    .get(key)
                    .and_then(Value::as_u64)
                    .and_then(|m| u32::try_from(m).ok())
            };
            if let Some(work) = minutes("work") {
                preferences.pomodoro.work = work;
            }
            if let Some(short_break) = minutes("shortBreak") {
                preferences.pomodoro.short_break = short_break;
            }
            if let Some(long_break) = minutes("longBreak") {
                preferences.pomodoro.long_break = long_break;
            }
        }

        self.store_preferences(&preferences)?;
        Ok(ApiResponse::ok(json!({"ok": true})))
    }

    fn reset_preferences(&self) -> Result<ApiResponse, HttpError> {
        let path = self.dir.join(PREFERENCES_FILE);
        if self.runtime.exists(&path) {
            self.runtime
                .remove_file(&path)
                .map_err(Self::fixture_error)?;
        }
        Ok(ApiResponse::ok(json!({"ok": true})))
    }
}

#[async_trait]
impl<R: Runtime> Transport for FixtureTransport<R> {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        debug!("Serving {} {} from fixtures", request.method, request.path);

        let path = request.path.as_str();
        match request.method {
            Method::GET if path == ME_PATH => self.me(),
            Method::GET => FIXTURE_FILES
                .iter()
                .find(|(route, _)| *route == path)
                .map(|(_, file)| self.serve_file(file))
                .unwrap_or_else(|| Err(Self::not_found(&request.method, path))),
            Method::PATCH if path == ME_PATH => self.update_preferences(request.body.as_ref()),
            Method::DELETE if path == PREFERENCES_PATH => self.reset_preferences(),
            _ => Err(Self::not_found(&request.method, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::path::Path;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_serves_collection_fixture() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .withf(|p| p == Path::new("/fixtures/habits.json"))
            .returning(|_| Ok(r#"{"success": true, "data": {"data": [{"id": "h1"}]}}"#.to_string()));

        let transport = FixtureTransport::new(runtime, "/fixtures");
        let response = transport.send(&ApiRequest::get("/api/habits")).await.unwrap();

        assert_eq!(response.data()["data"][0]["id"], "h1");
    }

    #[tokio::test]
    async fn test_unknown_route_fails() {
        let transport = FixtureTransport::new(MockRuntime::new(), "/fixtures");

        let err = transport
            .send(&ApiRequest::get("/api/finance/summary"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Mock GET not found for /api/finance/summary");

        let err = transport
            .send(&ApiRequest::post("/api/habits"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Mock POST not found for /api/habits");
    }

    #[tokio::test]
    async fn test_me_uses_default_preferences() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let transport = FixtureTransport::new(runtime, "/fixtures");
        let response = transport.send(&ApiRequest::get(ME_PATH)).await.unwrap();

        assert_eq!(response.body["name"], "Mock User");
        assert_eq!(response.body["preferences"]["theme"], "light");
        assert_eq!(response.body["preferences"]["pomodoro"]["work"], 25);
        assert_eq!(response.body["preferences"]["pomodoro"]["shortBreak"], 5);
        assert_eq!(response.body["preferences"]["pomodoro"]["longBreak"], 15);
    }

    #[tokio::test]
    async fn test_preferences_patch_and_reset() {
        let dir = tempdir().unwrap();
        let transport = FixtureTransport::new(RealRuntime, dir.path());

        let patch = ApiRequest::patch(ME_PATH).with_json(json!({
            "preferences": {"theme": "dark", "pomodoro": {"work": 50}}
        }));
        transport.send(&patch).await.unwrap();

        let me = transport.send(&ApiRequest::get(ME_PATH)).await.unwrap();
        assert_eq!(me.body["preferences"]["theme"], "dark");
        assert_eq!(me.body["preferences"]["pomodoro"]["work"], 50);
        assert_eq!(me.body["preferences"]["pomodoro"]["shortBreak"], 5);

        transport
            .send(&ApiRequest::delete(PREFERENCES_PATH))
            .await
            .unwrap();
        assert!(!dir.path().join(PREFERENCES_FILE).exists());

        let me = transport.send(&ApiRequest::get(ME_PATH)).await.unwrap();
        assert_eq!(me.body["preferences"]["theme"], "light");
    }

    #[tokio::test]
    async fn test_invalid_fixture_json() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("[oops".to_string()));

        let transport = FixtureTransport::new(runtime, "/fixtures");
        let err = transport
            .send(&ApiRequest::get("/api/tasks"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
