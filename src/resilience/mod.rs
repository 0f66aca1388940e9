//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Registration to the discovery registry:
//!     → retries.rs (bounded attempts, fixed delay)
//!     → each attempt yields an AttemptOutcome (success / failure / fault)
//!     → exhaustion is logged by the caller, never escalated
//! ```
//!
//! # Design Decisions
//! - Only transient failures are retried; bind and serve failures never are
//! - Every external call has a deadline (set on the client)

pub mod retries;

pub use retries::{AttemptOutcome, RetryPolicy};
