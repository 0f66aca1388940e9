//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! Every field has a default so an empty environment yields a runnable config.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener serving the schema-driven API and the liveness path.
    pub graphql: ListenerConfig,

    /// Listener serving the RPC transport and its health sub-protocol.
    pub grpc: ListenerConfig,

    /// Address advertised to the discovery registry.
    pub service_address: String,

    /// Discovery registry settings.
    pub registry: RegistryConfig,

    /// Shutdown coordination settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            graphql: ListenerConfig::with_port(4001),
            grpc: ListenerConfig::with_port(50051),
            service_address: "localhost".to_string(),
            registry: RegistryConfig::default(),
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind on (e.g., "0.0.0.0").
    pub bind_host: String,

    /// Port to bind on. Also the port advertised to the registry.
    pub port: u16,
}

impl ListenerConfig {
    /// Listener on all interfaces with the given port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port,
        }
    }

    /// The `host:port` string to bind on.
    ///
    /// IPv6 hosts are bracketed so the result always parses as a socket address.
    pub fn bind_address(&self) -> String {
        match self.bind_host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.bind_host, self.port),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::with_port(0)
    }
}

/// Discovery registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Attempt registration at startup.
    pub enabled: bool,

    /// Registry agent address (e.g., "127.0.0.1:8500" or "http://consul:8500").
    pub agent_address: String,

    /// Optional ACL token.
    pub token: Option<String>,

    /// Timeout for a single registry HTTP call in seconds.
    pub request_timeout_secs: u64,

    /// Maximum registration attempts per service.
    pub max_attempts: u32,

    /// Fixed delay between failed attempts in seconds.
    pub retry_delay_secs: u64,

    /// Health check the registry runs against each registered service.
    pub health_check: HealthCheckConfig,
}

impl RegistryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            agent_address: "127.0.0.1:8500".to_string(),
            token: None,
            request_timeout_secs: 5,
            max_attempts: 5,
            retry_delay_secs: 5,
            health_check: HealthCheckConfig::default(),
        }
    }
}

/// Registry-side health check configuration.
///
/// Durations are kept in the registry's own string form ("10s", "1m").
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Path probed on the advertised address.
    pub path: String,

    /// Probe interval.
    pub interval: String,

    /// Probe timeout.
    pub timeout: String,

    /// How long a service may stay critical before the registry drops it.
    pub deregister_critical_after: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            interval: "10s".to_string(),
            timeout: "5s".to_string(),
            deregister_critical_after: "1m".to_string(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time in-flight work gets to finish once the stop signal fires, in seconds.
    pub grace_period_secs: u64,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log line format.
    pub log_format: LogFormat,

    /// Prometheus exporter bind address. Metrics are disabled when unset.
    pub metrics_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = ServiceConfig::default();
        assert_eq!(config.graphql.port, 4001);
        assert_eq!(config.grpc.port, 50051);
        assert_eq!(config.service_address, "localhost");
        assert!(config.registry.enabled);
        assert_eq!(config.registry.max_attempts, 5);
        assert_eq!(config.registry.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.shutdown.grace_period(), Duration::from_secs(5));
        assert_eq!(config.registry.health_check.deregister_critical_after, "1m");
    }

    #[test]
    fn bind_address_brackets_ipv6() {
        let v4 = ListenerConfig::with_port(4001);
        assert_eq!(v4.bind_address(), "0.0.0.0:4001");

        let v6 = ListenerConfig {
            bind_host: "::1".to_string(),
            port: 50051,
        };
        assert_eq!(v6.bind_address(), "[::1]:50051");

        let named = ListenerConfig {
            bind_host: "localhost".to_string(),
            port: 80,
        };
        assert_eq!(named.bind_address(), "localhost:80");
    }
}
