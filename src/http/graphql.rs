//! Schema-driven request/response endpoint.
//!
//! The execution engine behind `/query` is an external collaborator reached
//! through [`QueryExecutor`]. This module only owns the transport: decoding the
//! request body, shaping the response, serving the playground page.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// A GraphQL-over-HTTP request body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
}

/// A GraphQL response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GraphqlResponse {
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![GraphqlError {
                message: message.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GraphqlError {
    pub message: String,
}

/// Executes operations against the schema.
pub trait QueryExecutor: Send + Sync + 'static {
    fn execute(&self, request: GraphqlRequest) -> BoxFuture<'_, GraphqlResponse>;
}

/// Executor used until a schema is wired in. Every operation resolves to an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedExecutor;

impl QueryExecutor for UnimplementedExecutor {
    fn execute(&self, request: GraphqlRequest) -> BoxFuture<'_, GraphqlResponse> {
        let operation = request
            .operation_name
            .unwrap_or_else(|| "anonymous operation".to_string());
        Box::pin(async move { GraphqlResponse::error(format!("not implemented: {operation}")) })
    }
}

/// Query-string form of a request: `variables` arrives JSON-encoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlParams {
    #[serde(default)]
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: Option<String>,
}

/// `POST /query`
pub async fn execute(
    State(executor): State<Arc<dyn QueryExecutor>>,
    Json(request): Json<GraphqlRequest>,
) -> Response {
    run(executor, request).await
}

/// `GET /query?query=...`
pub async fn execute_get(
    State(executor): State<Arc<dyn QueryExecutor>>,
    Query(params): Query<GraphqlParams>,
) -> Response {
    let variables = params
        .variables
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose();
    let variables = match variables {
        Ok(variables) => variables,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(GraphqlResponse::error(format!("invalid variables: {e}"))),
            )
                .into_response();
        }
    };

    let request = GraphqlRequest {
        query: params.query,
        operation_name: params.operation_name,
        variables,
    };
    run(executor, request).await
}

async fn run(executor: Arc<dyn QueryExecutor>, request: GraphqlRequest) -> Response {
    if request.query.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(GraphqlResponse::error("no operation provided")),
        )
            .into_response();
    }

    tracing::debug!(operation = ?request.operation_name, "Executing operation");
    Json(executor.execute(request).await).into_response()
}

/// `GET /`
pub async fn playground() -> Html<&'static str> {
    Html(PLAYGROUND_HTML)
}

const PLAYGROUND_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>GraphQL playground</title>
  <link rel="stylesheet" href="https://unpkg.com/graphiql/graphiql.min.css">
</head>
<body style="margin: 0;">
  <div id="graphiql" style="height: 100vh;"></div>
  <script crossorigin src="https://unpkg.com/react/umd/react.production.min.js"></script>
  <script crossorigin src="https://unpkg.com/react-dom/umd/react-dom.production.min.js"></script>
  <script crossorigin src="https://unpkg.com/graphiql/graphiql.min.js"></script>
  <script>
    const fetcher = GraphiQL.createFetcher({ url: '/query' });
    ReactDOM.render(React.createElement(GraphiQL, { fetcher }), document.getElementById('graphiql'));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unimplemented_executor_names_the_operation() {
        let response = UnimplementedExecutor
            .execute(GraphqlRequest {
                query: "query Config { config { id } }".into(),
                operation_name: Some("Config".into()),
                variables: None,
            })
            .await;
        assert_eq!(response, GraphqlResponse::error("not implemented: Config"));
    }

    #[test]
    fn request_accepts_camel_case_fields() {
        let request: GraphqlRequest = serde_json::from_str(
            r#"{"query":"{ a }","operationName":"A","variables":{"id":"1"}}"#,
        )
        .unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("A"));
        assert_eq!(request.variables, Some(serde_json::json!({"id": "1"})));
    }

    #[test]
    fn empty_errors_are_omitted() {
        let body = serde_json::to_value(GraphqlResponse {
            data: Some(serde_json::json!({"a": 1})),
            errors: Vec::new(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"data": {"a": 1}}));
    }
}
