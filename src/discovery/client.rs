//! Discovery registry client.
//!
//! The registry is an opaque remote service with a register/deregister contract.
//! It pulls health from each service on its own schedule; nothing here renews a
//! registration.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use url::Url;

use crate::config::RegistryConfig;
use crate::discovery::descriptor::Registration;

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Errors talking to the registry. All of them are treated as transient.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid registry address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build registry client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("registry request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("registry rejected request with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Contract of the external discovery registry.
pub trait RegistryClient: Send + Sync {
    fn register<'a>(
        &'a self,
        registration: &'a Registration,
    ) -> BoxFuture<'a, Result<(), RegistryError>>;

    fn deregister<'a>(&'a self, service_id: &'a str) -> BoxFuture<'a, Result<(), RegistryError>>;
}

/// Builds a fresh client for each registration attempt.
///
/// Construction may fail; that failure is one failed attempt.
pub trait ClientFactory: Send + Sync + 'static {
    fn build(&self) -> Result<Box<dyn RegistryClient>, RegistryError>;
}

impl<F> ClientFactory for Arc<F>
where
    F: ClientFactory,
{
    fn build(&self) -> Result<Box<dyn RegistryClient>, RegistryError> {
        F::build(self)
    }
}

/// Registry client speaking the Consul agent HTTP API.
#[derive(Debug, Clone)]
pub struct ConsulClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ConsulClient {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let base_url = agent_url(&config.agent_address)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(RegistryError::Client)?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RegistryError> {
        self.base_url
            .join(path)
            .map_err(|e| RegistryError::InvalidAddress {
                address: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn put(&self, url: Url, body: Option<&Registration>) -> Result<(), RegistryError> {
        let mut request = self.http.put(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(RegistryError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Rejected { status, body })
    }
}

impl RegistryClient for ConsulClient {
    fn register<'a>(
        &'a self,
        registration: &'a Registration,
    ) -> BoxFuture<'a, Result<(), RegistryError>> {
        Box::pin(async move {
            let url = self.endpoint("v1/agent/service/register")?;
            self.put(url, Some(registration)).await
        })
    }

    fn deregister<'a>(&'a self, service_id: &'a str) -> BoxFuture<'a, Result<(), RegistryError>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("v1/agent/service/deregister/{service_id}"))?;
            self.put(url, None).await
        })
    }
}

/// Builds a [`ConsulClient`] from configuration on every call.
#[derive(Debug, Clone)]
pub struct ConsulClientFactory {
    config: RegistryConfig,
}

impl ConsulClientFactory {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for ConsulClientFactory {
    fn build(&self) -> Result<Box<dyn RegistryClient>, RegistryError> {
        Ok(Box::new(ConsulClient::new(&self.config)?))
    }
}

/// Normalize an agent address into a base URL ending in `/`.
///
/// A bare `host:port` gets the `http` scheme, matching the agent's own default.
fn agent_url(address: &str) -> Result<Url, RegistryError> {
    let raw = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };

    let mut url = Url::parse(&raw).map_err(|e| RegistryError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_gets_http_scheme() {
        let url = agent_url("127.0.0.1:8500").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8500/");
    }

    #[test]
    fn path_prefix_is_kept() {
        let url = agent_url("https://consul.example.com/proxy").unwrap();
        let endpoint = url.join("v1/agent/service/register").unwrap();
        assert_eq!(
            endpoint.as_str(),
            "https://consul.example.com/proxy/v1/agent/service/register"
        );
    }

    #[test]
    fn garbage_address_is_rejected() {
        let err = agent_url("http://[not-a-host").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidAddress { .. }));
    }

    #[test]
    fn factory_surfaces_construction_errors() {
        let config = RegistryConfig {
            agent_address: "http://[broken".to_string(),
            ..RegistryConfig::default()
        };
        let factory = ConsulClientFactory::new(config);
        assert!(factory.build().is_err());
    }
}
