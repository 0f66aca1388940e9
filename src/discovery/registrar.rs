//! Best-effort registration with bounded, fixed-delay retries.
//!
//! # Responsibilities
//! - Run one independent retry loop per descriptor
//! - Contain faults inside a single attempt
//! - Remember which services made it into the registry
//!
//! # Design Decisions
//! - Registration never blocks startup and never fails the process
//! - A panic inside an attempt becomes `AttemptOutcome::Faulted`
//! - Attempts run inline in their loop, so aborting the loop cancels an attempt in flight
//! - Loops for different descriptors share nothing but the factory

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::DashSet;
use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::config::{HealthCheckConfig, RegistryConfig};
use crate::discovery::client::{ClientFactory, ConsulClientFactory, RegistryError};
use crate::discovery::descriptor::{Registration, ServiceDescriptor};
use crate::lifecycle::runner::panic_message;
use crate::observability::metrics;
use crate::resilience::{AttemptOutcome, RetryPolicy};

/// What one descriptor's retry sequence ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub attempts: u32,
    pub registered: bool,
}

/// Wraps a registry client factory with bounded retry.
pub struct RetryingRegistrar {
    factory: Arc<dyn ClientFactory>,
    policy: RetryPolicy,
    health_check: HealthCheckConfig,
    registered: DashSet<String>,
}

impl RetryingRegistrar {
    pub fn new(
        factory: impl ClientFactory,
        policy: RetryPolicy,
        health_check: HealthCheckConfig,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
            policy,
            health_check,
            registered: DashSet::new(),
        }
    }

    /// Registrar talking to the Consul agent described by `config`.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(
            ConsulClientFactory::new(config.clone()),
            RetryPolicy::fixed(config.max_attempts, config.retry_delay()),
            config.health_check.clone(),
        )
    }

    /// Run the full retry sequence for one descriptor.
    ///
    /// Stops at the first success or after the last attempt. Never returns an error.
    pub async fn register(&self, descriptor: &ServiceDescriptor) -> RegistrationSummary {
        let registration = descriptor.to_registration(&self.health_check);
        let max_attempts = self.policy.max_attempts;
        let service = descriptor.name();
        let mut attempt = 0;

        let registered = loop {
            attempt += 1;
            let outcome = self.attempt(&registration).await;
            metrics::record_registration_attempt(service, outcome.label());

            match &outcome {
                AttemptOutcome::Succeeded => {
                    tracing::info!(
                        service,
                        service_id = descriptor.id(),
                        attempt,
                        max_attempts,
                        "Registered service with registry"
                    );
                    self.registered.insert(descriptor.id().to_string());
                    break true;
                }
                AttemptOutcome::Failed(e) => {
                    tracing::warn!(service, attempt, max_attempts, error = %e, "Registration attempt failed");
                }
                AttemptOutcome::Faulted(fault) => {
                    tracing::error!(service, attempt, max_attempts, fault = %fault, "Registration attempt faulted");
                }
            }

            match self.policy.delay_after(attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    metrics::record_registration_exhausted(service);
                    break false;
                }
            }
        };

        tracing::info!(service, attempts = attempt, registered, "Completed registration attempts");
        RegistrationSummary {
            attempts: attempt,
            registered,
        }
    }

    /// One attempt: build a client, register. A panic inside the client is
    /// caught here and never reaches the loop.
    async fn attempt(&self, registration: &Registration) -> AttemptOutcome<RegistryError> {
        let attempt = async {
            let client = self.factory.build()?;
            client.register(registration).await
        };

        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(Ok(())) => AttemptOutcome::Succeeded,
            Ok(Err(e)) => AttemptOutcome::Failed(e),
            Err(payload) => AttemptOutcome::Faulted(panic_message(&*payload)),
        }
    }

    /// Start one detached retry loop per descriptor.
    ///
    /// The caller never joins the group; outcomes are only visible in logs.
    pub fn spawn_all<I>(self: &Arc<Self>, descriptors: I) -> RegistrationGroup
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        let mut tasks = JoinSet::new();
        for descriptor in descriptors {
            let registrar = Arc::clone(self);
            tasks.spawn(async move {
                registrar.register(&descriptor).await;
            });
        }
        RegistrationGroup { tasks }
    }

    /// IDs currently known to be registered, sorted.
    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registered.iter().map(|id| id.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Single best-effort deregistration of every service registered so far.
    pub async fn deregister_registered(&self) {
        let ids = self.registered_ids();
        if ids.is_empty() {
            return;
        }

        let client = match self.factory.build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping deregistration, registry client unavailable");
                return;
            }
        };

        let results =
            futures_util::future::join_all(ids.iter().map(|id| client.deregister(id))).await;

        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(()) => {
                    self.registered.remove(id);
                    tracing::info!(service_id = %id, "Deregistered service from registry");
                }
                Err(e) => {
                    tracing::warn!(service_id = %id, error = %e, "Deregistration failed");
                }
            }
        }
    }
}

/// Detached registration loops. Dropping the group aborts whatever is still retrying.
#[derive(Debug)]
pub struct RegistrationGroup {
    tasks: JoinSet<()>,
}

impl RegistrationGroup {
    /// Number of loops spawned and not yet reaped.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
