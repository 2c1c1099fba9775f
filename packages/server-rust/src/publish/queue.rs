use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use spendwire_core::{PublishError, Publisher};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::sink::EventSink;
use super::worker::{BackgroundRunnable, BackgroundWorker};

/// One record waiting for delivery.
#[derive(Debug)]
pub struct PublishTask {
    pub channel: String,
    pub payload: serde_json::Value,
    pub enqueued_at: Instant,
}

/// Drains publish tasks into an `EventSink`.
pub struct PublishRunnable {
    sink: Arc<dyn EventSink>,
    delivered: u64,
    failed: u64,
}

impl PublishRunnable {
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            delivered: 0,
            failed: 0,
        }
    }
}

#[async_trait]
impl BackgroundRunnable for PublishRunnable {
    type Task = PublishTask;

    async fn run(&mut self, task: PublishTask) {
        let queued_ms = u64::try_from(task.enqueued_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        match self.sink.send(&task.channel, &task.payload).await {
            Ok(()) => {
                self.delivered += 1;
                metrics::counter!("spendwire_publish_total", "result" => "delivered").increment(1);
                debug!(channel = %task.channel, queued_ms, "record delivered");
            }
            Err(err) => {
                self.failed += 1;
                metrics::counter!("spendwire_publish_total", "result" => "failed").increment(1);
                metrics::counter!("spendwire_publish_failures_total", "reason" => err.reason())
                    .increment(1);
                warn!(
                    channel = %task.channel,
                    reason = err.reason(),
                    error = %err,
                    payload = %task.payload,
                    "record delivery failed"
                );
            }
        }
    }

    async fn shutdown(&mut self) {
        info!(
            delivered = self.delivered,
            failed = self.failed,
            "publish worker stopped"
        );
    }
}

/// Background worker owning the publish queue's receiving end.
pub type PublishWorker = BackgroundWorker<PublishRunnable>;

/// Enqueue-only `Publisher` backed by a bounded channel.
///
/// `submit` never waits: a full queue refuses the record immediately so the
/// request path is never blocked on the event stream.
#[derive(Debug, Clone)]
pub struct QueuedPublisher {
    tx: mpsc::Sender<PublishTask>,
}

impl Publisher for QueuedPublisher {
    fn submit(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        let task = PublishTask {
            channel: channel.to_string(),
            payload,
            enqueued_at: Instant::now(),
        };
        match self.tx.try_send(task) {
            Ok(()) => {
                metrics::counter!("spendwire_publish_total", "result" => "enqueued").increment(1);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(PublishError::QueueFull {
                channel: channel.to_string(),
            }),
            Err(TrySendError::Closed(_)) => Err(PublishError::Closed),
        }
    }
}

/// Starts the publish worker draining into `sink`.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn start_publisher(sink: Arc<dyn EventSink>, capacity: usize) -> (QueuedPublisher, PublishWorker) {
    let (worker, tx) = BackgroundWorker::start(PublishRunnable::new(sink), capacity);
    (QueuedPublisher { tx }, worker)
}
