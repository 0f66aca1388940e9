//! Top-level orchestration of runners and registration.
//!
//! # State Machine
//! ```text
//! Starting ──runners spawned──▶ Running ──signal | first failure | all exited──▶ ShuttingDown ──drained──▶ Stopped
//! ```
//!
//! # Design Decisions
//! - The supervisor is the only writer of the stop signal and the only reader of failures
//! - The first failure decides the outcome; later ones are logged and dropped
//! - Registration runs detached and never feeds back into the state machine
//! - Runner drain is capped at grace + 1s; stragglers are aborted

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::discovery::{RetryingRegistrar, ServiceDescriptor};
use crate::lifecycle::runner::{panic_message, FailureReport, RunnerError, ServiceRunner};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;

/// Extra time granted to runners on top of their own grace period.
const DRAIN_SLACK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

/// Why the supervisor left `Running`.
#[derive(Debug)]
pub enum ShutdownReason {
    /// An interrupt arrived.
    Signal,
    /// A runner failed; the first report wins.
    Failure(FailureReport),
    /// Every runner returned without being asked to.
    RunnersExited,
}

impl ShutdownReason {
    /// The failure that caused the shutdown, if any.
    pub fn into_failure(self) -> Option<FailureReport> {
        match self {
            ShutdownReason::Failure(report) => Some(report),
            ShutdownReason::Signal | ShutdownReason::RunnersExited => None,
        }
    }
}

pub struct Supervisor {
    grace_period: Duration,
    runners: Vec<Box<dyn ServiceRunner>>,
    registration: Option<(Arc<RetryingRegistrar>, Vec<ServiceDescriptor>)>,
    state: watch::Sender<SupervisorState>,
}

impl Supervisor {
    pub fn new(grace_period: Duration) -> Self {
        let (state, _) = watch::channel(SupervisorState::Starting);
        Self {
            grace_period,
            runners: Vec::new(),
            registration: None,
            state,
        }
    }

    pub fn with_runner(mut self, runner: impl ServiceRunner) -> Self {
        self.runners.push(Box::new(runner));
        self
    }

    /// Register `descriptors` through `registrar` once running.
    pub fn with_registration(
        mut self,
        registrar: Arc<RetryingRegistrar>,
        descriptors: Vec<ServiceDescriptor>,
    ) -> Self {
        self.registration = Some((registrar, descriptors));
        self
    }

    pub fn runner_names(&self) -> Vec<&'static str> {
        self.runners.iter().map(|runner| runner.name()).collect()
    }

    /// Descriptors that will be registered; empty when registration is off.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        self.registration
            .as_ref()
            .map(|(_, descriptors)| descriptors.as_slice())
            .unwrap_or_default()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Run every runner until `interrupt` completes or one of them fails,
    /// then shut everything down and report why.
    pub async fn run<F>(self, interrupt: F) -> ShutdownReason
    where
        F: Future<Output = ()>,
    {
        let Supervisor {
            grace_period,
            runners,
            registration,
            state,
        } = self;

        let shutdown = Shutdown::new();
        let (failure_tx, mut failure_rx) = mpsc::channel(runners.len().max(1));

        let registration_group = registration
            .as_ref()
            .map(|(registrar, descriptors)| registrar.spawn_all(descriptors.clone()));

        let mut handles = JoinSet::new();
        let mut names = HashMap::new();
        for runner in runners {
            let name = runner.name();
            let stop = shutdown.subscribe();
            let failures = failure_tx.clone();

            let handle = handles.spawn(async move {
                let outcome = match AssertUnwindSafe(runner.run(stop)).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(payload) => Err(RunnerError::Crashed(panic_message(&*payload))),
                };
                if let Err(cause) = outcome {
                    tracing::error!(runner = name, error = %cause, "Runner failed");
                    metrics::record_runner_failure(name);
                    // Full channel means a failure is already queued; that one wins.
                    let _ = failures.try_send(FailureReport { source: name, cause });
                }
            });
            names.insert(handle.id(), name);
            tracing::info!(runner = name, "Runner started");
        }
        drop(failure_tx);
        transition(&state, SupervisorState::Running);

        let reason = tokio::select! {
            _ = interrupt => ShutdownReason::Signal,
            report = failure_rx.recv() => match report {
                Some(report) => ShutdownReason::Failure(report),
                None => ShutdownReason::RunnersExited,
            },
        };
        match &reason {
            ShutdownReason::Signal => tracing::info!("Interrupt received, shutting down"),
            ShutdownReason::Failure(report) => {
                tracing::error!(runner = report.source, error = %report.cause, "Shutting down after runner failure")
            }
            ShutdownReason::RunnersExited => tracing::warn!("All runners exited, shutting down"),
        }

        transition(&state, SupervisorState::ShuttingDown);
        drop(registration_group);
        shutdown.trigger();

        let deregistration = async {
            if let Some((registrar, _)) = &registration {
                let finished =
                    tokio::time::timeout(grace_period, registrar.deregister_registered()).await;
                if finished.is_err() {
                    tracing::warn!(grace_period = ?grace_period, "Deregistration did not finish in time");
                }
            }
        };
        let drain = drain_runners(&mut handles, &mut names, grace_period + DRAIN_SLACK);
        tokio::join!(deregistration, drain);

        transition(&state, SupervisorState::Stopped);
        reason
    }
}

/// Wait for every runner task, aborting whatever is left at `deadline`.
async fn drain_runners(
    handles: &mut JoinSet<()>,
    names: &mut HashMap<tokio::task::Id, &'static str>,
    deadline: Duration,
) {
    let joined = tokio::time::timeout(deadline, async {
        while let Some(joined) = handles.join_next_with_id().await {
            let id = match joined {
                Ok((id, ())) => id,
                Err(e) => e.id(),
            };
            if let Some(name) = names.remove(&id) {
                tracing::info!(runner = name, "Runner stopped");
            }
        }
    })
    .await;

    if joined.is_err() {
        let stuck: Vec<&'static str> = names.values().copied().collect();
        tracing::warn!(runners = ?stuck, deadline = ?deadline, "Runners did not stop in time, aborting");
        handles.abort_all();
        while handles.join_next().await.is_some() {}
    }
}

fn transition(state: &watch::Sender<SupervisorState>, next: SupervisorState) {
    let previous = state.send_replace(next);
    tracing::info!(from = ?previous, to = ?next, "Supervisor state changed");
}
