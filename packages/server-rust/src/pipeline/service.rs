//! `tower::Service` adapter for the pipeline.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use spendwire_core::{PipelineOutcome, RawMessage};
use tower::Service;

use super::orchestrator::Pipeline;

/// Errors raised by the service stack around the pipeline.
///
/// The pipeline itself never fails: every result, including extraction
/// failure, is a `PipelineOutcome`. Only middleware produces these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("server overloaded, try again later")]
    Overloaded,
}

/// Future type shared by the pipeline service and its middleware.
pub type PipelineFuture =
    Pin<Box<dyn Future<Output = Result<PipelineOutcome, PipelineError>> + Send>>;

/// Innermost service: hands each `RawMessage` to the shared `Pipeline`.
#[derive(Clone)]
pub struct PipelineService {
    pipeline: Arc<Pipeline>,
}

impl PipelineService {
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

impl Service<RawMessage> for PipelineService {
    type Response = PipelineOutcome;
    type Error = PipelineError;
    type Future = PipelineFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, msg: RawMessage) -> Self::Future {
        let pipeline = Arc::clone(&self.pipeline);
        Box::pin(async move { Ok(pipeline.handle(msg.body()).await) })
    }
}
