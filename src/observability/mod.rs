//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Runners, registrar, supervisor
//!     → logging.rs (tracing events, text or JSON on stdout)
//!     → metrics.rs (registration outcomes, runner up/down, in-flight requests)
//!
//! Scraped from:
//!     → METRICS_ADDRESS, only when configured
//! ```
//!
//! # Design Decisions
//! - Every registration attempt and every runner start/stop/error is logged
//! - Without an exporter the metrics facade is a no-op

pub mod logging;
pub mod metrics;
