//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Runner start
//!     → listener.rs (bind, report local address)
//!     → listener handed to exactly one server (HTTP or RPC)
//!
//! Accepted connection
//!     → serve.rs (one task per connection, owned by the serve future)
//!     → connection.rs (in-flight guard held for the request lifetime)
//! ```
//!
//! # Design Decisions
//! - Each runner owns its listener exclusively; nothing is shared across runners
//! - Bind failures surface immediately and are never retried
//! - Connection tasks never outlive the serve future that accepted them

pub mod connection;
pub mod listener;
pub mod serve;

pub use connection::{InFlightGuard, InFlightTracker};
pub use listener::{bind, ListenerError};
pub use serve::serve_connections;
