//! Configuration validation.
//!
//! Semantic checks on a [`ServiceConfig`]. All failures are collected and returned
//! together so an operator can fix the environment in one pass.

use std::net::IpAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("advertised service address is empty")]
    EmptyServiceAddress,

    #[error("bind host {0:?} is not an IP address")]
    InvalidBindHost(String),

    #[error("registry agent address is empty")]
    EmptyRegistryAddress,

    #[error("registry max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("shutdown grace period must be non-zero")]
    ZeroGracePeriod,
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_address.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceAddress);
    }

    for listener in [&config.graphql, &config.grpc] {
        if listener.bind_host.parse::<IpAddr>().is_err() {
            let err = ValidationError::InvalidBindHost(listener.bind_host.clone());
            if !errors.contains(&err) {
                errors.push(err);
            }
        }
    }

    if config.registry.enabled {
        if config.registry.agent_address.trim().is_empty() {
            errors.push(ValidationError::EmptyRegistryAddress);
        }
        if config.registry.max_attempts == 0 {
            errors.push(ValidationError::ZeroAttempts);
        }
    }

    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError::ZeroGracePeriod);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ServiceConfig::default();
        config.service_address = "  ".to_string();
        config.graphql.bind_host = "not-an-ip".to_string();
        config.grpc.bind_host = "not-an-ip".to_string();
        config.shutdown.grace_period_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyServiceAddress,
                ValidationError::InvalidBindHost("not-an-ip".to_string()),
                ValidationError::ZeroGracePeriod,
            ]
        );
    }

    #[test]
    fn registry_settings_ignored_when_disabled() {
        let mut config = ServiceConfig::default();
        config.registry.enabled = false;
        config.registry.agent_address = String::new();
        config.registry.max_attempts = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn shared_port_is_left_to_the_listeners() {
        let mut config = ServiceConfig::default();
        config.graphql.port = 7000;
        config.grpc.port = 7000;
        assert!(validate_config(&config).is_ok());
    }
}
