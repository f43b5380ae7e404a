//! Progress analytics and coaching computed by the server.

use anyhow::Result;
use serde_json::Value;

use super::{fetch_data, segment};
use crate::client::ApiClient;
use crate::http::ApiRequest;

pub const DEFAULT_VELOCITY_DAYS: u32 = 30;

/// Completion velocity over the last `days` days.
#[tracing::instrument(skip(client))]
pub async fn velocity(client: &ApiClient, days: u32) -> Result<Value> {
    let request = ApiRequest::get("/api/analytics/velocity").with_param("days", days);
    fetch_data(client, request, "Failed to load velocity").await
}

#[tracing::instrument(skip(client))]
pub async fn streak(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/analytics/streak"),
        "Failed to load streak",
    )
    .await
}

/// Projected completion of one roadmap.
#[tracing::instrument(skip(client))]
pub async fn predict(client: &ApiClient, roadmap_id: &str) -> Result<Value> {
    let request = ApiRequest::get(format!("/api/analytics/predict/{}", segment(roadmap_id)?));
    fetch_data(client, request, "Failed to load prediction").await
}

#[tracing::instrument(skip(client))]
pub async fn bottlenecks(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/analytics/bottlenecks"),
        "Failed to load bottlenecks",
    )
    .await
}

#[tracing::instrument(skip(client))]
pub async fn categories(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/analytics/categories"),
        "Failed to load category distribution",
    )
    .await
}

/// Full report, scoped to one roadmap when `roadmap_id` is given.
#[tracing::instrument(skip(client))]
pub async fn report(client: &ApiClient, roadmap_id: Option<&str>) -> Result<Value> {
    let request =
        ApiRequest::get("/api/analytics/report").with_optional_param("roadmapId", roadmap_id);
    fetch_data(client, request, "Failed to load analytics report").await
}

#[tracing::instrument(skip(client))]
pub async fn dashboard(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/analytics/dashboard"),
        "Failed to load analytics dashboard",
    )
    .await
}

#[tracing::instrument(skip(client))]
pub async fn weekly_coaching(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::post("/api/analytics/coaching/weekly"),
        "Failed to load weekly coaching",
    )
    .await
}

#[tracing::instrument(skip(client))]
pub async fn goal_recommendations(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/analytics/recommendations/goals"),
        "Failed to load goal recommendations",
    )
    .await
}

/// Asks the server to draft milestones for a goal.
#[tracing::instrument(skip(client))]
pub async fn suggest_milestones(client: &ApiClient, goal_id: &str) -> Result<Value> {
    let path = format!("/api/analytics/suggest/milestones/{}", segment(goal_id)?);
    fetch_data(client, ApiRequest::post(path), "Failed to suggest milestones").await
}
