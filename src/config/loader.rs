//! Configuration loading from the process environment.

use std::collections::HashMap;

use envconfig::Envconfig;

use crate::config::schema::{LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment error: {0}")]
    Env(#[from] envconfig::Error),

    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Recognized environment variables.
#[derive(Envconfig, Debug)]
pub struct EnvConfig {
    #[envconfig(from = "GRAPHQL_PORT", default = "4001")]
    pub graphql_port: u16,

    #[envconfig(from = "GRPC_PORT", default = "50051")]
    pub grpc_port: u16,

    #[envconfig(from = "SERVICE_ADDRESS", default = "localhost")]
    pub service_address: String,

    /// Only the exact value "true" enables registration.
    #[envconfig(from = "CONSUL_ENABLED", default = "true")]
    pub consul_enabled: String,

    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub bind_host: String,

    #[envconfig(from = "CONSUL_HTTP_ADDR", default = "127.0.0.1:8500")]
    pub consul_http_addr: String,

    #[envconfig(from = "CONSUL_HTTP_TOKEN")]
    pub consul_http_token: Option<String>,

    #[envconfig(from = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,

    #[envconfig(from = "LOG_FORMAT", default = "text")]
    pub log_format: String,
}

impl EnvConfig {
    /// Map raw environment values onto the typed schema.
    pub fn into_config(self) -> Result<ServiceConfig, ConfigError> {
        let log_format = match self.log_format.as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            _ => {
                return Err(ConfigError::InvalidValue {
                    var: "LOG_FORMAT",
                    value: self.log_format,
                })
            }
        };

        let mut config = ServiceConfig::default();
        config.graphql.port = self.graphql_port;
        config.graphql.bind_host = self.bind_host.clone();
        config.grpc.port = self.grpc_port;
        config.grpc.bind_host = self.bind_host;
        config.service_address = self.service_address;
        config.registry.enabled = self.consul_enabled == "true";
        config.registry.agent_address = self.consul_http_addr;
        config.registry.token = self.consul_http_token.filter(|t| !t.is_empty());
        config.observability.log_format = log_format;
        config.observability.metrics_address = self.metrics_address.filter(|a| !a.is_empty());
        Ok(config)
    }
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    finish(EnvConfig::init_from_env()?)
}

/// Load and validate configuration from an explicit variable map.
pub fn load_from_map(vars: &HashMap<String, String>) -> Result<ServiceConfig, ConfigError> {
    finish(EnvConfig::init_from_hashmap(vars)?)
}

fn finish(env: EnvConfig) -> Result<ServiceConfig, ConfigError> {
    let config = env.into_config()?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
