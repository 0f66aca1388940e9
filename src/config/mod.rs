//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (envconfig: raw variables → ServiceConfig)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed by reference to startup, which builds runners and descriptors
//! ```
//!
//! # Design Decisions
//! - Environment variables are the only control surface
//! - All fields have defaults so an empty environment is a valid config
//! - Validation separates parsing (envconfig) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, load_from_map, ConfigError};
pub use schema::{
    HealthCheckConfig, ListenerConfig, LogFormat, ObservabilityConfig, RegistryConfig,
    ServiceConfig, ShutdownConfig,
};
