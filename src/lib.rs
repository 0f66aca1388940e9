//! Dual-protocol service host with best-effort registry registration.

// Core subsystems
pub mod config;
pub mod grpc;
pub mod http;
pub mod net;

// Coordination
pub mod discovery;
pub mod lifecycle;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use config::ServiceConfig;
pub use lifecycle::{build_supervisor, ShutdownReason, Supervisor};
