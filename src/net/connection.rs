//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests admitted by a listener and not yet answered
//! - Let the owning runner report how much work the grace period abandoned

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Tracks in-flight requests for one listener.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active_count: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        let now = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_in_flight(now);
        InFlightGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    /// Current in-flight request count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard held for the lifetime of one request.
#[derive(Debug)]
pub struct InFlightGuard {
    active_count: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_in_flight(now);
    }
}

/// Axum middleware holding an [`InFlightGuard`] while the inner handler runs.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = tracker.track();
    next.run(request).await
}
