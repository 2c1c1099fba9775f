//! Metrics middleware for pipeline invocations.
//!
//! Wraps each invocation in a `pipeline` tracing span and records its
//! duration and outcome through the `metrics` facade.

use std::task::{Context, Poll};
use std::time::Instant;

use spendwire_core::{PipelineOutcome, RawMessage};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::pipeline::service::{PipelineError, PipelineFuture};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments pipeline invocations with timing and outcome.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records invocation duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<RawMessage> for MetricsService<S>
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
        let span = info_span!(
            "pipeline",
            message_len = msg.body().len(),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(msg);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(outcome) => outcome.as_str(),
                    Err(PipelineError::Overloaded) => "overloaded",
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                metrics::counter!("spendwire_pipeline_outcomes_total", "outcome" => outcome)
                    .increment(1);
                metrics::histogram!("spendwire_pipeline_duration_seconds")
                    .record(elapsed.as_secs_f64());

                tracing::info!(duration_ms, outcome, "pipeline complete");

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
