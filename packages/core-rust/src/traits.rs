use async_trait::async_trait;

use crate::outcome::{ExtractionError, PublishError};
use crate::record::ExpenseRecord;

/// Structured-extraction capability backed by an external model.
///
/// Implementations make exactly one outbound call per `extract`, keep no
/// state between calls, and never retry. They do not classify: any text
/// handed in is attempted.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ExpenseRecord, ExtractionError>;
}

/// Enqueue-only event sink.
///
/// `submit` hands a serialized payload to the boundary and returns without
/// waiting for delivery. An `Err` means the payload was not accepted at all;
/// failures after acceptance are the boundary's to log and count.
pub trait Publisher: Send + Sync {
    /// Enqueue `payload` on the named channel.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the payload could not be enqueued.
    fn submit(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError>;
}
