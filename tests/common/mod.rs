//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::put,
    Router,
};
use tokio::net::TcpListener;
use tonic::transport::Channel;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

use nginx_service::config::ServiceConfig;

/// Config bound to localhost on fixed ports, registration off.
pub fn test_config(graphql_port: u16, grpc_port: u16) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.graphql.bind_host = "127.0.0.1".into();
    config.graphql.port = graphql_port;
    config.grpc.bind_host = "127.0.0.1".into();
    config.grpc.port = grpc_port;
    config.service_address = "127.0.0.1".into();
    config.registry.enabled = false;
    config
}

/// Poll `GET /health` until it answers 200 or the attempts run out.
pub async fn wait_for_http(port: u16) -> bool {
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(res) = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await
        {
            if res.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Overall RPC health status, retrying while the server comes up.
pub async fn grpc_status(port: u16) -> Option<i32> {
    for _ in 0..100 {
        let endpoint = Channel::from_shared(format!("http://127.0.0.1:{port}")).unwrap();
        if let Ok(channel) = endpoint.connect().await {
            if let Ok(response) = HealthClient::new(channel)
                .check(HealthCheckRequest {
                    service: String::new(),
                })
                .await
            {
                return Some(response.into_inner().status);
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

/// True once nothing accepts connections on `port`.
pub async fn is_closed(port: u16) -> bool {
    tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .is_err()
}

/// One request seen by the mock registry.
#[derive(Debug, Clone)]
pub struct RegistryCall {
    pub path: String,
    pub token: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Clone)]
struct MockRegistry {
    status: StatusCode,
    calls: Arc<Mutex<Vec<RegistryCall>>>,
}

/// Start a mock Consul agent answering every call with `status`.
pub async fn start_mock_registry(
    addr: SocketAddr,
    status: StatusCode,
) -> Arc<Mutex<Vec<RegistryCall>>> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let state = MockRegistry {
        status,
        calls: Arc::clone(&calls),
    };

    let app = Router::new()
        .route("/v1/agent/service/register", put(register))
        .route("/v1/agent/service/deregister/{id}", put(deregister))
        .with_state(state);

    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    calls
}

fn token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-consul-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn register(State(mock): State<MockRegistry>, headers: HeaderMap, body: String) -> StatusCode {
    mock.calls.lock().unwrap().push(RegistryCall {
        path: "/v1/agent/service/register".into(),
        token: token(&headers),
        body: serde_json::from_str(&body).ok(),
    });
    mock.status
}

async fn deregister(
    State(mock): State<MockRegistry>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    mock.calls.lock().unwrap().push(RegistryCall {
        path: format!("/v1/agent/service/deregister/{id}"),
        token: token(&headers),
        body: None,
    });
    mock.status
}
