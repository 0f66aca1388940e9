//! Registry client and registration tests against a mock agent.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::sync::oneshot;

use nginx_service::config::RegistryConfig;
use nginx_service::discovery::{
    ConsulClient, RegistryClient, RegistryError, RetryingRegistrar, ServiceDescriptor,
};
use nginx_service::lifecycle::{build_supervisor, service_descriptors, ShutdownReason};

mod common;

fn registry_config(addr: SocketAddr) -> RegistryConfig {
    RegistryConfig {
        agent_address: addr.to_string(),
        token: Some("secret-token".into()),
        retry_delay_secs: 1,
        max_attempts: 3,
        ..RegistryConfig::default()
    }
}

fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(
        "graphql-service",
        "GraphQL",
        "10.0.0.5",
        4001,
        ["graphql", "http"],
        "/health",
    )
}

#[tokio::test]
async fn register_sends_agent_payload_and_token() {
    let addr: SocketAddr = "127.0.0.1:25101".parse().unwrap();
    let calls = common::start_mock_registry(addr, StatusCode::OK).await;

    let config = registry_config(addr);
    let client = ConsulClient::new(&config).unwrap();
    let registration = descriptor().to_registration(&config.health_check);
    client.register(&registration).await.unwrap();

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/v1/agent/service/register");
    assert_eq!(calls[0].token.as_deref(), Some("secret-token"));
    assert_eq!(
        calls[0].body,
        Some(serde_json::json!({
            "ID": "graphql-service",
            "Name": "GraphQL",
            "Tags": ["graphql", "http"],
            "Address": "10.0.0.5",
            "Port": 4001,
            "Check": {
                "HTTP": "http://10.0.0.5:4001/health",
                "Interval": "10s",
                "Timeout": "5s",
                "DeregisterCriticalServiceAfter": "1m"
            }
        }))
    );
}

#[tokio::test]
async fn error_status_is_rejected() {
    let addr: SocketAddr = "127.0.0.1:25102".parse().unwrap();
    let _calls = common::start_mock_registry(addr, StatusCode::INTERNAL_SERVER_ERROR).await;

    let config = registry_config(addr);
    let client = ConsulClient::new(&config).unwrap();
    let err = client
        .register(&descriptor().to_registration(&config.health_check))
        .await
        .unwrap_err();

    match err {
        RegistryError::Rejected { status, .. } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_agent_is_transport_error() {
    // Nothing listens here.
    let config = registry_config("127.0.0.1:25103".parse().unwrap());
    let client = ConsulClient::new(&config).unwrap();
    let err = client.deregister("graphql-service").await.unwrap_err();
    assert!(matches!(err, RegistryError::Transport(_)));
}

#[tokio::test]
async fn registrar_gives_up_after_configured_attempts() {
    let addr: SocketAddr = "127.0.0.1:25104".parse().unwrap();
    let calls = common::start_mock_registry(addr, StatusCode::SERVICE_UNAVAILABLE).await;

    let registrar = RetryingRegistrar::from_config(&registry_config(addr));
    let summary = registrar.register(&descriptor()).await;

    assert!(!summary.registered);
    assert_eq!(summary.attempts, 3);
    assert_eq!(calls.lock().unwrap().len(), 3);
    assert!(registrar.registered_ids().is_empty());
}

#[tokio::test]
async fn supervisor_registers_and_deregisters_both_services() {
    let registry_addr: SocketAddr = "127.0.0.1:25111".parse().unwrap();
    let calls = common::start_mock_registry(registry_addr, StatusCode::OK).await;

    let mut config = common::test_config(25112, 25113);
    config.registry = registry_config(registry_addr);
    let expected: Vec<String> = service_descriptors(&config)
        .iter()
        .map(|d| d.id().to_string())
        .collect();

    let supervisor = build_supervisor(&config);
    let (stop, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(supervisor.run(async move {
        let _ = rx.await;
    }));

    assert!(common::wait_for_http(25112).await);
    let mut registered = 0;
    for _ in 0..100 {
        registered = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path.ends_with("/register"))
            .count();
        if registered == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(registered, 2);

    stop.send(()).unwrap();
    let reason = tokio::time::timeout(Duration::from_secs(7), handle)
        .await
        .expect("supervisor stopped in time")
        .unwrap();
    assert!(matches!(reason, ShutdownReason::Signal));

    let mut deregistered: Vec<String> = calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|c| c.path.strip_prefix("/v1/agent/service/deregister/"))
        .map(str::to_string)
        .collect();
    deregistered.sort();
    assert_eq!(deregistered, expected);
}

#[tokio::test]
async fn unreachable_registry_does_not_block_serving() {
    let mut config = common::test_config(25121, 25122);
    config.registry = registry_config("127.0.0.1:25123".parse().unwrap());

    let supervisor = build_supervisor(&config);
    let (stop, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(supervisor.run(async move {
        let _ = rx.await;
    }));

    assert!(common::wait_for_http(25121).await);
    assert!(common::grpc_status(25122).await.is_some());

    stop.send(()).unwrap();
    let reason = handle.await.unwrap();
    assert!(matches!(reason, ShutdownReason::Signal));
}

#[tokio::test]
async fn disabled_registration_never_calls_the_registry() {
    let registry_addr: SocketAddr = "127.0.0.1:25131".parse().unwrap();
    let calls = common::start_mock_registry(registry_addr, StatusCode::OK).await;

    let mut config = common::test_config(25132, 25133);
    config.registry = RegistryConfig {
        enabled: false,
        ..registry_config(registry_addr)
    };

    let supervisor = build_supervisor(&config);
    assert!(supervisor.descriptors().is_empty());

    let (stop, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(supervisor.run(async move {
        let _ = rx.await;
    }));

    assert!(common::wait_for_http(25132).await);
    assert!(common::grpc_status(25133).await.is_some());
    tokio::time::sleep(Duration::from_millis(300)).await;

    stop.send(()).unwrap();
    let reason = handle.await.unwrap();
    assert!(matches!(reason, ShutdownReason::Signal));
    assert!(calls.lock().unwrap().is_empty());
}
