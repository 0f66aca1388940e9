//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create Axum Router with the API, playground and liveness routes
//! - Wire up middleware (tracing, request ID, limits, in-flight tracking)
//! - Bind the listener and serve until the stop signal
//! - Drain in-flight requests within the grace period

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use futures_util::future::BoxFuture;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::graphql::{self, QueryExecutor, UnimplementedExecutor};
use crate::lifecycle::runner::{serve_until_stopped, Drain, RunnerError, ServiceRunner};
use crate::lifecycle::StopSignal;
use crate::net::{self, connection::track_in_flight, InFlightTracker};
use crate::observability::metrics;

/// Runner name used in logs and failure reports.
pub const NAME: &str = "graphql";

/// Liveness path polled by the registry.
pub const HEALTH_PATH: &str = "/health";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Runner for the schema-driven HTTP service.
pub struct GraphqlRunner {
    address: String,
    grace_period: Duration,
    executor: Arc<dyn QueryExecutor>,
}

impl GraphqlRunner {
    pub fn new(address: impl Into<String>, grace_period: Duration) -> Self {
        Self {
            address: address.into(),
            grace_period,
            executor: Arc::new(UnimplementedExecutor),
        }
    }

    /// Replace the executor behind `/query`.
    pub fn with_executor(mut self, executor: Arc<dyn QueryExecutor>) -> Self {
        self.executor = executor;
        self
    }

    async fn serve(self, stop: StopSignal) -> Result<(), RunnerError> {
        let listener = net::bind(&self.address).await?;
        let local_addr = net::listener::local_addr(&listener, &self.address)?;

        let tracker = InFlightTracker::new();
        let app = build_router(self.executor, tracker.clone());

        tracing::info!(runner = NAME, address = %local_addr, "GraphQL server is running");
        metrics::record_runner_up(NAME, true);

        let server = net::serve_connections(NAME, listener, app, stop.clone());

        let result = serve_until_stopped(NAME, server, &stop, self.grace_period).await;
        metrics::record_runner_up(NAME, false);

        if let Ok(Drain::Abandoned) = result {
            tracing::warn!(
                runner = NAME,
                abandoned = tracker.active_count(),
                "Abandoned in-flight requests"
            );
        }
        result?;

        tracing::info!(runner = NAME, "GraphQL server stopped");
        Ok(())
    }
}

impl ServiceRunner for GraphqlRunner {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(self: Box<Self>, stop: StopSignal) -> BoxFuture<'static, Result<(), RunnerError>> {
        Box::pin((*self).serve(stop))
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(executor: Arc<dyn QueryExecutor>, tracker: InFlightTracker) -> Router {
    Router::new()
        .route("/", get(graphql::playground))
        .route("/query", post(graphql::execute).get(graphql::execute_get))
        .with_state(executor)
        .route(HEALTH_PATH, get(health))
        .layer(middleware::from_fn_with_state(tracker, track_in_flight))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
}

/// Liveness: healthy as soon as the listener is bound.
async fn health() -> StatusCode {
    StatusCode::OK
}
