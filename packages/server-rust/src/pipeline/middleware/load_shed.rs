//! Load-shedding middleware for pipeline invocations.
//!
//! Rejects invocations when more than `max_concurrent` are already in flight
//! with `PipelineError::Overloaded`.

use std::sync::Arc;
use std::task::{Context, Poll};

use spendwire_core::{PipelineOutcome, RawMessage};
use tokio::sync::Semaphore;
use tower::{Layer, Service};

use crate::pipeline::service::{PipelineError, PipelineFuture};

// ---------------------------------------------------------------------------
// LoadShedLayer
// ---------------------------------------------------------------------------

/// Tower layer that limits concurrent invocations via a semaphore.
///
/// When all permits are taken, incoming messages are rejected immediately
/// rather than queued.
#[derive(Debug, Clone)]
pub struct LoadShedLayer {
    semaphore: Arc<Semaphore>,
}

impl LoadShedLayer {
    /// Create a new `LoadShedLayer` with the given concurrency limit.
    #[must_use]
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
        }
    }
}

impl<S> Layer<S> for LoadShedLayer {
    type Service = LoadShedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoadShedService {
            inner,
            semaphore: Arc::clone(&self.semaphore),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadShedService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces a concurrency limit.
#[derive(Debug, Clone)]
pub struct LoadShedService<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
}

impl<S> Service<RawMessage> for LoadShedService<S>
where
    S: Service<RawMessage, Response = PipelineOutcome, Error = PipelineError> + Send,
    S::Future: Send + 'static,
{
    type Response = PipelineOutcome;
    type Error = PipelineError;
    type Future = PipelineFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, msg: RawMessage) -> Self::Future {
        let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
            tracing::warn!("pipeline at capacity, shedding message");
            metrics::counter!("spendwire_load_shed_total").increment(1);
            return Box::pin(async { Err(PipelineError::Overloaded) });
        };

        let fut = self.inner.call(msg);
        Box::pin(async move {
            // Held for the whole invocation.
            let result = fut.await;
            drop(permit);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
