use anyhow::Result;
use serde_json::{Value, json};

use crate::api;
use crate::client::ApiClient;

use super::print_json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitAction {
    List,
    Create { name: String },
    Toggle { id: String },
    Delete { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    List {
        from: Option<String>,
        to: Option<String>,
    },
    Complete {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[tracing::instrument(skip(client))]
pub async fn habits(client: &ApiClient, action: HabitAction) -> Result<()> {
    let output = match action {
        HabitAction::List => Value::Array(api::habits::list(client).await?),
        HabitAction::Create { name } => {
            api::habits::create(client, json!({ "name": name })).await?
        }
        HabitAction::Toggle { id } => api::habits::toggle(client, &id).await?,
        HabitAction::Delete { id } => api::habits::delete(client, &id).await?,
    };
    print_json(&output);
    Ok(())
}

#[tracing::instrument(skip(client))]
pub async fn tasks(client: &ApiClient, action: TaskAction) -> Result<()> {
    let output = match action {
        TaskAction::List { from, to } => {
            api::tasks::list(client, from.as_deref(), to.as_deref()).await?
        }
        TaskAction::Complete { id } => api::tasks::complete(client, &id).await?,
        TaskAction::Delete { id } => api::tasks::delete(client, &id).await?,
    };
    print_json(&output);
    Ok(())
}

#[tracing::instrument(skip(client))]
pub async fn finance_summary(client: &ApiClient) -> Result<()> {
    print_json(&api::finance::summary(client).await?);
    Ok(())
}

#[tracing::instrument(skip(client))]
pub async fn report_today(client: &ApiClient) -> Result<()> {
    print_json(&api::reports::today(client).await?);
    Ok(())
}

#[tracing::instrument(skip(client))]
pub async fn me(client: &ApiClient) -> Result<()> {
    print_json(&api::users::me(client).await?);
    Ok(())
}
