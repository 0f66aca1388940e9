//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! startup builds one ServiceDescriptor per runner
//!     → registrar.rs spawns a detached retry loop per descriptor
//!     → each attempt: ClientFactory::build → RegistryClient::register
//!     → outcome logged and counted, never reported to the supervisor
//!
//! During shutdown:
//!     → registrar.rs deregisters whatever registered, once, best-effort
//! ```
//!
//! # Design Decisions
//! - Discoverability is best-effort; serving never waits on it
//! - The registry pulls health; no heartbeat or renewal loop here

pub mod client;
pub mod descriptor;
pub mod registrar;

pub use client::{ClientFactory, ConsulClient, ConsulClientFactory, RegistryClient, RegistryError};
pub use descriptor::{Registration, RegistrationCheck, ServiceDescriptor};
pub use registrar::{RegistrationGroup, RegistrationSummary, RetryingRegistrar};
