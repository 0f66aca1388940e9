//! TCP listener setup.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Report the bound local address
//! - Classify bind failures as configuration errors (never retried)

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The address resolved to nothing usable.
    #[error("failed to resolve {address}")]
    Resolve {
        address: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind a TCP listener on `address` (`host:port`, hostnames resolved).
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let resolved = resolve(address).await?;
    let listener = TcpListener::bind(resolved)
        .await
        .map_err(|source| ListenerError::Bind {
            address: address.to_string(),
            source,
        })?;

    let local_addr = local_addr(&listener, address)?;
    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}

async fn resolve(address: &str) -> Result<SocketAddr, ListenerError> {
    let mut candidates = tokio::net::lookup_host(address)
        .await
        .map_err(|source| ListenerError::Resolve {
            address: address.to_string(),
            source: Some(source),
        })?;

    candidates.next().ok_or_else(|| ListenerError::Resolve {
        address: address.to_string(),
        source: None,
    })
}

/// The address a bound listener actually occupies.
pub fn local_addr(listener: &TcpListener, address: &str) -> Result<SocketAddr, ListenerError> {
    listener.local_addr().map_err(|source| ListenerError::Bind {
        address: address.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn occupied_port_is_bind_error() {
        let first = bind("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().unwrap().to_string();

        match bind(&taken).await.unwrap_err() {
            ListenerError::Bind { address, .. } => assert_eq!(address, taken),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_port_is_resolve_error() {
        let err = bind("127.0.0.1").await.unwrap_err();
        assert!(matches!(err, ListenerError::Resolve { .. }));
    }
}
