//! Classifier → Extractor → Publisher composition.

use std::sync::Arc;

use spendwire_core::{Classifier, Extractor, PipelineOutcome, Publisher, EXPENSE_CHANNEL};
use tracing::{debug, warn};

/// Runs one message through classification, extraction, and publish.
///
/// All three collaborators are injected at construction. The pipeline keeps
/// no per-request state, so a single instance is shared across concurrent
/// requests behind an `Arc`.
pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
    extractor: Arc<dyn Extractor>,
    publisher: Arc<dyn Publisher>,
}

impl Pipeline {
    /// Creates a pipeline publishing to the `expense_service` channel.
    #[must_use]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        extractor: Arc<dyn Extractor>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            classifier,
            extractor,
            publisher,
        }
    }

    /// Handles one message.
    ///
    /// Text the classifier rejects never reaches the extractor. An extraction
    /// failure is returned as-is and nothing is published. On success the
    /// record is serialized and submitted exactly once; a refused submission
    /// is logged and counted but does not change the outcome.
    pub async fn handle(&self, text: &str) -> PipelineOutcome {
        if !self.classifier.classify(text) {
            debug!("message is not a bank transaction");
            return PipelineOutcome::Rejected;
        }

        let record = match self.extractor.extract(text).await {
            Ok(record) => record,
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "extraction failed");
                metrics::counter!("spendwire_extraction_failures_total", "kind" => err.kind())
                    .increment(1);
                return PipelineOutcome::ExtractionFailed(err);
            }
        };

        if let Err(err) = self.publisher.submit(EXPENSE_CHANNEL, record.serialize()) {
            warn!(
                channel = EXPENSE_CHANNEL,
                reason = err.reason(),
                error = %err,
                "publish submission refused"
            );
            metrics::counter!("spendwire_publish_failures_total", "reason" => err.reason())
                .increment(1);
        }

        PipelineOutcome::Published(record)
    }
}
