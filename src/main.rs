//! nginx-service
//!
//! Hosts two network services side by side and announces them to a service
//! registry.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                    Supervisor                    │
//!                     │                                                  │
//!   HTTP clients ─────┼─▶ GraphqlRunner  (/, /query, /health)            │
//!                     │                                                  │
//!   RPC clients  ─────┼─▶ GrpcRunner     (grpc.health.v1.Health)         │
//!                     │                                                  │
//!                     │   RetryingRegistrar ── detached ──▶ Consul agent │
//!                     │                                                  │
//!   SIGINT/SIGTERM ───┼─▶ StopSignal ──▶ drain (grace period) ──▶ exit   │
//!                     └──────────────────────────────────────────────────┘
//! ```

use nginx_service::config;
use nginx_service::lifecycle::{build_supervisor, wait_for_shutdown_signal};
use nginx_service::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init_logging(config::LogFormat::Text);
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(config.observability.log_format)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nginx-service starting");

    tracing::info!(
        graphql_port = config.graphql.port,
        grpc_port = config.grpc.port,
        service_address = %config.service_address,
        registration_enabled = config.registry.enabled,
        grace_period_secs = config.shutdown.grace_period_secs,
        "Configuration loaded"
    );

    if let Some(address) = &config.observability.metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => {
                tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address")
            }
        }
    }

    let supervisor = build_supervisor(&config);
    let interrupt = async {
        if let Err(e) = wait_for_shutdown_signal().await {
            tracing::error!(error = %e, "Failed to install signal handlers");
            std::future::pending::<()>().await;
        }
    };

    let reason = supervisor.run(interrupt).await;
    tracing::info!("Shutdown complete");

    match reason.into_failure() {
        Some(report) => Err(report.into()),
        None => Ok(()),
    }
}
