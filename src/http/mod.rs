//! HTTP service subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, limits, in-flight tracking)
//!     → GET /        → graphql.rs playground page
//!     → POST /query  → graphql.rs → QueryExecutor
//!     → GET /health  → 200 while the listener is up
//! ```

pub mod graphql;
pub mod server;

pub use graphql::{GraphqlRequest, GraphqlResponse, QueryExecutor, UnimplementedExecutor};
pub use server::{build_router, GraphqlRunner, HEALTH_PATH};
