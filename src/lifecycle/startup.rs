//! Startup wiring.
//!
//! # Responsibilities
//! - Turn a validated configuration into runners and service descriptors
//! - Attach the registrar only when registration is enabled
//!
//! # Design Decisions
//! - Nothing here binds or connects; all I/O starts in `Supervisor::run`
//! - Both services advertise the same address with their own port

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::discovery::{RetryingRegistrar, ServiceDescriptor};
use crate::grpc::GrpcRunner;
use crate::http::GraphqlRunner;
use crate::lifecycle::supervisor::Supervisor;

/// One descriptor per listener, in runner order.
pub fn service_descriptors(config: &ServiceConfig) -> Vec<ServiceDescriptor> {
    let check_path = &config.registry.health_check.path;
    vec![
        ServiceDescriptor::new(
            "graphql-service",
            "GraphQL",
            &config.service_address,
            config.graphql.port,
            ["graphql", "http"],
            check_path,
        ),
        ServiceDescriptor::new(
            "grpc-service",
            "gRPC",
            &config.service_address,
            config.grpc.port,
            ["grpc"],
            check_path,
        ),
    ]
}

/// Build the supervisor for `config`: both runners, plus registration when enabled.
pub fn build_supervisor(config: &ServiceConfig) -> Supervisor {
    let grace_period = config.shutdown.grace_period();

    let supervisor = Supervisor::new(grace_period)
        .with_runner(GraphqlRunner::new(config.graphql.bind_address(), grace_period))
        .with_runner(GrpcRunner::new(config.grpc.bind_address(), grace_period));

    if !config.registry.enabled {
        tracing::info!("Service registration disabled");
        return supervisor;
    }

    let registrar = Arc::new(RetryingRegistrar::from_config(&config.registry));
    supervisor.with_registration(registrar, service_descriptors(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_follow_configured_ports() {
        let mut config = ServiceConfig::default();
        config.service_address = "10.0.0.5".into();
        config.graphql.port = 8080;
        config.grpc.port = 9090;

        let descriptors = service_descriptors(&config);

        assert_eq!(descriptors.len(), 2);
        let graphql = &descriptors[0];
        assert_eq!(graphql.id(), "graphql-service");
        assert_eq!(graphql.name(), "GraphQL");
        assert_eq!(graphql.port(), 8080);
        assert!(graphql.tags().contains("graphql") && graphql.tags().contains("http"));
        assert_eq!(graphql.health_check_url(), "http://10.0.0.5:8080/health");

        let grpc = &descriptors[1];
        assert_eq!(grpc.id(), "grpc-service");
        assert_eq!(grpc.name(), "gRPC");
        assert_eq!(grpc.port(), 9090);
        assert_eq!(grpc.tags().len(), 1);
        assert_eq!(grpc.health_check_url(), "http://10.0.0.5:9090/health");
    }

    #[test]
    fn registration_enabled_attaches_both_descriptors() {
        let config = ServiceConfig::default();
        let supervisor = build_supervisor(&config);

        assert_eq!(supervisor.runner_names(), vec!["graphql", "grpc"]);
        assert_eq!(supervisor.descriptors().len(), 2);
    }

    #[test]
    fn registration_disabled_has_no_descriptors() {
        let mut config = ServiceConfig::default();
        config.registry.enabled = false;
        let supervisor = build_supervisor(&config);

        assert_eq!(supervisor.runner_names().len(), 2);
        assert!(supervisor.descriptors().is_empty());
    }
}
