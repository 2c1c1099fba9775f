use async_trait::async_trait;
use spendwire_core::PublishError;
use tracing::info;

/// Delivery target for published records.
///
/// Called from the publish worker only, one payload at a time.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one payload to the named channel.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the sink cannot be reached or refuses the payload.
    async fn send(&self, channel: &str, payload: &serde_json::Value) -> Result<(), PublishError>;
}

/// Sink used when no event stream is configured: logs each record and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn send(&self, channel: &str, payload: &serde_json::Value) -> Result<(), PublishError> {
        info!(channel, %payload, "no event sink configured, record logged only");
        Ok(())
    }
}
