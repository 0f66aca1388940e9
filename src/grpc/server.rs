//! RPC server lifecycle.
//!
//! Serves the standard `grpc.health.v1.Health` service. The overall status
//! (empty service name) flips to `SERVING` once the listener is bound and back
//! to `NOT_SERVING` as soon as the stop signal closes, before the drain starts.
//! Connections are served on [`net::serve_connections`], so calls still open
//! when the grace period runs out are dropped with the runner.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tonic::service::Routes;
use tonic_health::ServingStatus;

use crate::lifecycle::runner::{serve_until_stopped, Drain, RunnerError, ServiceRunner};
use crate::lifecycle::StopSignal;
use crate::net;
use crate::observability::metrics;

/// Runner name used in logs and failure reports.
pub const NAME: &str = "grpc";

/// Empty service name: the status of the server as a whole.
const OVERALL: &str = "";

/// Runner for the RPC service.
pub struct GrpcRunner {
    address: String,
    grace_period: Duration,
}

impl GrpcRunner {
    pub fn new(address: impl Into<String>, grace_period: Duration) -> Self {
        Self {
            address: address.into(),
            grace_period,
        }
    }

    async fn serve(self, stop: StopSignal) -> Result<(), RunnerError> {
        let listener = net::bind(&self.address).await?;
        let local_addr = net::listener::local_addr(&listener, &self.address)?;

        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_service_status(OVERALL, ServingStatus::Serving)
            .await;

        tracing::info!(runner = NAME, address = %local_addr, "gRPC server is running");
        tracing::info!(runner = NAME, "gRPC health check available at grpc.health.v1.Health/Check");
        metrics::record_runner_up(NAME, true);

        let app = Routes::new(health_service).into_axum_router();
        let shutdown = stop.clone();
        let server = async move {
            let serving = net::serve_connections(NAME, listener, app, shutdown.clone());
            tokio::pin!(serving);
            tokio::select! {
                result = &mut serving => return result,
                _ = shutdown.stopped() => {}
            }
            health_reporter
                .set_service_status(OVERALL, ServingStatus::NotServing)
                .await;
            serving.await
        };

        let result = serve_until_stopped(NAME, server, &stop, self.grace_period).await;
        metrics::record_runner_up(NAME, false);

        if let Drain::Abandoned = result? {
            tracing::warn!(runner = NAME, "Abandoned in-flight calls");
        }

        tracing::info!(runner = NAME, "gRPC server stopped");
        Ok(())
    }
}

impl ServiceRunner for GrpcRunner {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(self: Box<Self>, stop: StopSignal) -> BoxFuture<'static, Result<(), RunnerError>> {
        Box::pin((*self).serve(stop))
    }
}
