//! Service runner contract.
//!
//! A runner owns one network-facing service for its whole life: bind, serve,
//! observe the stop signal, drain within the grace period, return.

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::lifecycle::shutdown::StopSignal;
use crate::net::ListenerError;

/// Fatal runner errors. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The listener could not be bound. A configuration problem.
    #[error(transparent)]
    Bind(#[from] ListenerError),

    /// The serve loop failed.
    #[error("serve failed: {0}")]
    Serve(String),

    /// The serve loop ended although no stop was requested.
    #[error("server exited before shutdown was requested")]
    Exited,

    /// The runner's task panicked or was cancelled.
    #[error("runner crashed: {0}")]
    Crashed(String),
}

/// One network-facing service.
pub trait ServiceRunner: Send + 'static {
    /// Stable identity used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Bind, serve until `stop` closes, then shut down gracefully.
    ///
    /// Returns early with an error if binding or serving fails.
    fn run(self: Box<Self>, stop: StopSignal) -> BoxFuture<'static, Result<(), RunnerError>>;
}

/// The first fatal error of a runner, sent to the supervisor.
#[derive(Debug)]
pub struct FailureReport {
    pub source: &'static str,
    pub cause: RunnerError,
}

impl std::fmt::Display for FailureReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} runner failed: {}", self.source, self.cause)
    }
}

impl std::error::Error for FailureReport {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// How a runner's shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// In-flight work finished inside the grace period.
    Completed,
    /// The grace period expired; remaining work was abandoned.
    Abandoned,
}

/// Drive a server future whose graceful shutdown is wired to `stop`.
///
/// Before the stop signal, the server ending at all is fatal. After it, the
/// server gets `grace` to finish draining; past that the future is dropped,
/// together with every connection task it owns.
/// Errors raised while draining are logged, not returned: shutdown is already
/// underway and nobody is listening for a second failure.
pub async fn serve_until_stopped<F, E>(
    name: &'static str,
    server: F,
    stop: &StopSignal,
    grace: Duration,
) -> Result<Drain, RunnerError>
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => {
            return match result {
                Ok(()) if stop.is_stopped() => Ok(Drain::Completed),
                Ok(()) => Err(RunnerError::Exited),
                Err(e) => Err(RunnerError::Serve(e.to_string())),
            };
        }
        _ = stop.stopped() => {}
    }

    tracing::info!(runner = name, grace_period = ?grace, "Stop signal received, draining");

    match tokio::time::timeout(grace, server).await {
        Ok(Ok(())) => Ok(Drain::Completed),
        Ok(Err(e)) => {
            tracing::warn!(runner = name, error = %e, "Server error while draining");
            Ok(Drain::Completed)
        }
        Err(_) => {
            tracing::warn!(runner = name, grace_period = ?grace, "Grace period elapsed, forcing shutdown");
            Ok(Drain::Abandoned)
        }
    }
}

/// Readable text from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
