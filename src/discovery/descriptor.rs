//! Service descriptors and their registry wire form.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::HealthCheckConfig;

/// Immutable description of one service to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    id: String,
    name: String,
    address: String,
    port: u16,
    tags: BTreeSet<String>,
    health_check_path: String,
}

impl ServiceDescriptor {
    pub fn new<I, T>(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        tags: I,
        health_check_path: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            port,
            tags: tags.into_iter().map(Into::into).collect(),
            health_check_path: health_check_path.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// URL the registry polls for this service's health.
    pub fn health_check_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.address, self.port, self.health_check_path
        )
    }

    /// Build the registry payload for this descriptor.
    pub fn to_registration(&self, check: &HealthCheckConfig) -> Registration {
        Registration {
            id: self.id.clone(),
            name: self.name.clone(),
            tags: self.tags.iter().cloned().collect(),
            address: self.address.clone(),
            port: self.port,
            check: RegistrationCheck {
                http: self.health_check_url(),
                interval: check.interval.clone(),
                timeout: check.timeout.clone(),
                deregister_critical_service_after: check.deregister_critical_after.clone(),
            },
        }
    }
}

/// Agent service registration body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Registration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    pub check: RegistrationCheck,
}

/// HTTP health check the registry runs against the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationCheck {
    #[serde(rename = "HTTP")]
    pub http: String,
    pub interval: String,
    pub timeout: String,
    pub deregister_critical_service_after: String,
}
