//! Connection-owning accept loop.
//!
//! # Responsibilities
//! - Accept connections and serve each one on its own task
//! - Keep every connection task in a `JoinSet` owned by the serve future
//! - On stop: close the listener, ask each connection to finish gracefully,
//!   wait for them
//!
//! Dropping the serve future drops the `JoinSet`, which aborts every
//! connection still open. Runners rely on this when the grace period expires.

use std::io;

use axum::{body::Body, Router};
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tower::Service;

use crate::lifecycle::StopSignal;

/// Serve `app` on `listener` until `stop` closes and open connections drain.
///
/// Accept errors tied to a single peer are logged and skipped; any other
/// accept error ends the loop.
pub async fn serve_connections(
    name: &'static str,
    listener: TcpListener,
    app: Router,
    stop: StopSignal,
) -> io::Result<()> {
    let builder = AutoBuilder::new(TokioExecutor::new());
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = stop.stopped() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) if is_peer_error(&e) => {
                        tracing::debug!(runner = name, error = %e, "Accept failed for one peer");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!(runner = name, %peer, error = %e, "Failed to set TCP_NODELAY");
                }
                connections.spawn(serve_connection(
                    name,
                    builder.clone(),
                    stream,
                    app.clone(),
                    stop.clone(),
                ));
            }
        }
    }

    drop(listener);
    tracing::debug!(runner = name, open = connections.len(), "Listener closed, draining connections");
    while connections.join_next().await.is_some() {}
    Ok(())
}

async fn serve_connection(
    name: &'static str,
    builder: AutoBuilder<TokioExecutor>,
    stream: TcpStream,
    app: Router,
    stop: StopSignal,
) {
    let service = hyper::service::service_fn(move |request: Request<Incoming>| {
        let mut app = app.clone();
        async move { app.call(request.map(Body::new)).await }
    });

    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                tracing::debug!(runner = name, error = %e, "Connection closed with error");
            }
            return;
        }
        _ = stop.stopped() => conn.as_mut().graceful_shutdown(),
    }

    if let Err(e) = conn.await {
        tracing::debug!(runner = name, error = %e, "Connection closed with error while draining");
    }
}

fn is_peer_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
