//! RPC service subsystem.
//!
//! The business services are mounted by their owners; this layer provides
//! the listener, the health service and the shutdown wiring.

pub mod server;

pub use server::GrpcRunner;
