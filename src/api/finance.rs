use anyhow::Result;
use serde_json::Value;

use super::{fetch_body, fetch_data, segment};
use crate::client::ApiClient;
use crate::http::ApiRequest;

/// Filters for [`transactions`]; unset fields are left out of the query.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub kind: Option<String>,
    pub category_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TransactionFilter {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .with_optional_param("from", self.from.as_deref())
            .with_optional_param("to", self.to.as_deref())
            .with_optional_param("type", self.kind.as_deref())
            .with_optional_param("categoryId", self.category_id.as_deref())
            .with_optional_param("page", self.page)
            .with_optional_param("limit", self.limit)
    }
}

// Transactions

#[tracing::instrument(skip(client))]
pub async fn transactions(client: &ApiClient, filter: &TransactionFilter) -> Result<Value> {
    let request = filter.apply(ApiRequest::get("/api/finance/transactions"));
    fetch_data(client, request, "Failed to load transactions").await
}

#[tracing::instrument(skip(client, transaction))]
pub async fn create_transaction(client: &ApiClient, transaction: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/finance/transactions").with_json(transaction);
    fetch_data(client, request, "Failed to create transaction").await
}

#[tracing::instrument(skip(client, changes))]
pub async fn update_transaction(client: &ApiClient, id: &str, changes: Value) -> Result<Value> {
    let path = format!("/api/finance/transactions/{}", segment(id)?);
    let request = ApiRequest::patch(path).with_json(changes);
    fetch_data(client, request, "Failed to update transaction").await
}

#[tracing::instrument(skip(client))]
pub async fn delete_transaction(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/finance/transactions/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete transaction").await
}

// Categories

/// All categories, or only those of `kind` ("income" / "expense").
#[tracing::instrument(skip(client))]
pub async fn categories(client: &ApiClient, kind: Option<&str>) -> Result<Value> {
    let request = ApiRequest::get("/api/finance/categories").with_optional_param("type", kind);
    fetch_data(client, request, "Failed to load categories").await
}

#[tracing::instrument(skip(client, category))]
pub async fn create_category(client: &ApiClient, category: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/finance/categories").with_json(category);
    fetch_data(client, request, "Failed to create category").await
}

#[tracing::instrument(skip(client, changes))]
pub async fn update_category(client: &ApiClient, id: &str, changes: Value) -> Result<Value> {
    let path = format!("/api/finance/categories/{}", segment(id)?);
    let request = ApiRequest::patch(path).with_json(changes);
    fetch_data(client, request, "Failed to update category").await
}

#[tracing::instrument(skip(client))]
pub async fn delete_category(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/finance/categories/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete category").await
}

// Budgets

#[tracing::instrument(skip(client))]
pub async fn budgets(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/finance/budgets"),
        "Failed to load budgets",
    )
    .await
}

/// Creates the budget, or replaces the one for the same category and period.
#[tracing::instrument(skip(client, budget))]
pub async fn upsert_budget(client: &ApiClient, budget: Value) -> Result<Value> {
    let request = ApiRequest::post("/api/finance/budgets").with_json(budget);
    fetch_data(client, request, "Failed to save budget").await
}

#[tracing::instrument(skip(client))]
pub async fn delete_budget(client: &ApiClient, id: &str) -> Result<Value> {
    let request = ApiRequest::delete(format!("/api/finance/budgets/{}", segment(id)?));
    fetch_body(client, request, "Failed to delete budget").await
}

#[tracing::instrument(skip(client))]
pub async fn summary(client: &ApiClient) -> Result<Value> {
    fetch_data(
        client,
        ApiRequest::get("/api/finance/summary"),
        "Failed to load finance summary",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_transactions_filter_skips_unset_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/finance/transactions")
            .match_query(Matcher::Exact("type=expense&page=2".to_string()))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"data": [], "pagination": {"page": 2}}}"#)
            .create_async()
            .await;

        let filter = TransactionFilter {
            kind: Some("expense".to_string()),
            page: Some(2),
            ..Default::default()
        };
        let data = transactions(&client_for(&server.url()), &filter)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(data["pagination"]["page"], 2);
    }

    #[tokio::test]
    async fn test_categories_by_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/finance/categories")
            .match_query(Matcher::UrlEncoded("type".into(), "income".into()))
            .with_status(200)
            .with_body(r#"{"success": true, "data": [{"id": "c1", "type": "income"}]}"#)
            .create_async()
            .await;

        let data = categories(&client_for(&server.url()), Some("income"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(data[0]["id"], "c1");
    }

    #[tokio::test]
    async fn test_create_transaction_sends_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/finance/transactions")
            .match_body(Matcher::Json(json!({"amount": 42.5, "type": "expense"})))
            .with_status(201)
            .with_body(r#"{"success": true, "data": {"id": "tx1"}}"#)
            .create_async()
            .await;

        let created = create_transaction(
            &client_for(&server.url()),
            json!({"amount": 42.5, "type": "expense"}),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(created["id"], "tx1");
    }

    #[tokio::test]
    async fn test_summary_failure_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/finance/summary")
            .with_status(503)
            .create_async()
            .await;

        let err = summary(&client_for(&server.url())).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load finance summary");
    }
}
