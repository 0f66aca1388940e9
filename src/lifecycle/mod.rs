//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → runners + descriptors → Supervisor
//!
//! Running (supervisor.rs):
//!     Spawn runners → spawn detached registration → wait for {interrupt, first failure}
//!
//! Shutdown (shutdown.rs):
//!     Close StopSignal once → runners drain within grace → deregister → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → interrupt future handed to the supervisor
//! ```
//!
//! # Design Decisions
//! - Runners never restart; any fatal error shuts the whole process down
//! - Shutdown has a deadline: forced teardown after the grace period

pub mod runner;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use runner::{FailureReport, RunnerError, ServiceRunner};
pub use shutdown::{Shutdown, StopSignal};
pub use signals::wait_for_shutdown_signal;
pub use startup::{build_supervisor, service_descriptors};
pub use supervisor::{ShutdownReason, Supervisor, SupervisorState};
