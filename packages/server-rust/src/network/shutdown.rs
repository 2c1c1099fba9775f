//! Drain state shared by the server loop and the message handler.
//!
//! A `watch` channel carries the draining flag: the handler reads it to turn
//! away late requests, and `NetworkModule::serve` waits on it to start the
//! drain deadline. An atomic counter with RAII guards tracks requests that
//! are inside the pipeline so an expired drain can report what it abandoned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Coordinates shutdown across the server:
/// 1. Handlers hold an `InFlightGuard` for the life of a pipeline invocation
/// 2. `trigger_shutdown()` marks the server as draining and wakes receivers
/// 3. Handlers answer 503 while `is_draining()` holds
#[derive(Debug)]
pub struct ShutdownController {
    shutdown_signal: watch::Sender<bool>,
    in_flight: Arc<AtomicU64>,
}

impl ShutdownController {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            shutdown_signal: tx,
            in_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a receiver that observes `true` once shutdown is triggered.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_signal.subscribe()
    }

    /// Marks the server as draining and notifies every receiver.
    pub fn trigger_shutdown(&self) {
        self.shutdown_signal.send_replace(true);
    }

    #[must_use]
    pub fn is_draining(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    /// Creates an RAII guard that tracks an in-flight request.
    ///
    /// The counter is decremented when the guard is dropped, including when
    /// the request future is cancelled or the handler panics.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that decrements the in-flight counter when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Resolves on SIGINT (Ctrl-C) or, on Unix, SIGTERM.
///
/// If a handler cannot be installed that signal source is ignored and the
/// future waits on the remaining one.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}
