//! Roadmaps, their goals, and the milestones under each goal.

use anyhow::Result;
use serde_json::{Value, json};

use super::{fetch_body, fetch_data, segment};
use crate::client::ApiClient;
use crate::http::ApiRequest;

#[derive(Debug, Clone, Default)]
pub struct RoadmapFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// New position of one goal or milestone in a reorder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub id: String,
    pub order: u32,
}

fn orderings(items: &[Ordering]) -> Value {
    items
        .iter()
        .map(|item| json!({ "id": item.id, "order": item.order }))
        .collect()
}

// Roadmaps

#[tracing::instrument(skip(client))]
pub async fn list(client: &ApiClient, filter: &RoadmapFilter) -> Result<Value> {
    let request = ApiRequest::get("/api/roadmap")
        .with_optional_param("status", filter.status.as_deref())
        .with_optional_param("category", filter.category.as_deref())
        .with_optional_param("page", filter.page)
        .with_optional_param("limit", filter.limit);
    fetch_data(client, request, "Failed to load roadmaps").await
}

#[tracing::instrument(skip(client))]
pub async fn get(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::get(format!("/api/roadmap/{}", segment(id)?));
    fetch_data(client, request, "Failed to load roadmap").await
}

#[tracing::instrument(skip(client, roadmap))]
pub async fn create(client: &ApiClient, roadmap: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/roadmap").with_json(roadmap);
    fetch_data(client, request, "Failed to create roadmap").await
}

#[tracing::instrument(skip(client, changes))]
pub async fn update(client: &ApiClient, id: &str, changes: Value) -> Result<Value> {
    let request = ApiRequest::patch(format!("/api/roadmap/{}", segment(id)?)).with_json(changes);
    fetch_data(client, request, "Failed to update roadmap").await
}

#[tracing::instrument(skip(client))]
pub async fn delete(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/roadmap/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete roadmap").await
}

#[tracing::instrument(skip(client))]
pub async fn stats(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::get(format!("/api/roadmap/{}/stats", segment(id)?));
    fetch_data(client, request, "Failed to load roadmap stats").await
}

/// Asks the server to draft a roadmap from a free-form prompt.
#[tracing::instrument(skip(client, prompt))]
pub async fn generate(client: &ApiClient, prompt: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/roadmap/generate").with_json(prompt);
    fetch_data(client, request, "Failed to generate roadmap").await
}

// Goals

#[tracing::instrument(skip(client))]
pub async fn goals(client: &ApiClient, roadmap_id: &str) -> Result<Value> {
    let request = ApiRequest::get(format!("/api/roadmap/{}/goals", segment(roadmap_id)?));
    fetch_data(client, request, "Failed to load goals").await
}

#[tracing::instrument(skip(client))]
pub async fn get_goal(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::get(format!("/api/roadmap/goals/{}", segment(id)?));
    fetch_data(client, request, "Failed to load goal").await
}

#[tracing::instrument(skip(client, goal))]
pub async fn create_goal(client: &ApiClient, roadmap_id: &str, goal: Value) -> Result<Value> {
    let path = format!("/api/roadmap/{}/goals", segment(roadmap_id)?);
    let request = ApiRequest::post(path).with_json(goal);
    fetch_data(client, request, "Failed to create goal").await
}

#[tracing::instrument(skip(client, changes))]
pub async fn update_goal(client: &ApiClient, id: &str, changes: Value) -> Result<Value> {
    let path = format!("/api/roadmap/goals/{}", segment(id)?);
    let request = ApiRequest::patch(path).with_json(changes);
    fetch_data(client, request, "Failed to update goal").await
}

#[tracing::instrument(skip(client))]
pub async fn delete_goal(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/roadmap/goals/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete goal").await
}

#[tracing::instrument(skip(client))]
pub async fn reorder_goals(client: &ApiClient, goals: &[Ordering]) -> Result<Value> {
    let request = ApiRequest::post("/api/roadmap/goals/reorder")
        .with_json(json!({ "goals": orderings(goals) }));
    fetch_body(client, request, "Failed to reorder goals").await
}

// Milestones

#[tracing::instrument(skip(client))]
pub async fn milestones(client: &ApiClient, goal_id: &str) -> Result<Value> {
    let request = ApiRequest::get(format!("/api/roadmap/goals/{}/milestones", segment(goal_id)?));
    fetch_data(client, request, "Failed to load milestones").await
}

#[tracing::instrument(skip(client))]
pub async fn get_milestone(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::get(format!("/api/roadmap/milestones/{}", segment(id)?));
    fetch_data(client, request, "Failed to load milestone").await
}

#[tracing::instrument(skip(client, milestone))]
pub async fn create_milestone(
    client: &ApiClient,
    goal_id: &str,
    milestone: Value,
) -> Result<Value> {
    let path = format!("/api/roadmap/goals/{}/milestones", segment(goal_id)?);
    let request = ApiRequest::post(path).with_json(milestone);
    fetch_data(client, request, "Failed to create milestone").await
}

#[tracing::instrument(skip(client, changes))]
pub async fn update_milestone(client: &ApiClient, id: &str, changes: Value) -> Result<Value> {
    let path = format!("/api/roadmap/milestones/{}", segment(id)?);
    let request = ApiRequest::patch(path).with_json(changes);
    fetch_data(client, request, "Failed to update milestone").await
}

#[tracing::instrument(skip(client))]
pub async fn delete_milestone(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/roadmap/milestones/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete milestone").await
}

#[tracing::instrument(skip(client))]
pub async fn complete_milestone(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::post(format!("/api/roadmap/milestones/{}/complete", segment(id)?));
    fetch_data(client, request, "Failed to complete milestone").await
}

/// Milestones due soon across one roadmap.
#[tracing::instrument(skip(client))]
pub async fn upcoming_milestones(
    client: &ApiClient,
    roadmap_id: &str,
    limit: Option<u32>,
) -> Result<Value> {
    let path = format!("/api/roadmap/{}/milestones/upcoming", segment(roadmap_id)?);
    let request = ApiRequest::get(path).with_optional_param("limit", limit);
    fetch_data(client, request, "Failed to load upcoming milestones").await
}

#[tracing::instrument(skip(client))]
pub async fn reorder_milestones(client: &ApiClient, milestones: &[Ordering]) -> Result<Value> {
    let request = ApiRequest::post("/api/roadmap/milestones/reorder")
        .with_json(json!({ "milestones": orderings(milestones) }));
    fetch_body(client, request, "Failed to reorder milestones").await
}
