//! Publish boundary: a bounded in-process queue in front of an event sink.
//!
//! The pipeline only ever enqueues (`QueuedPublisher::submit`). A background
//! worker drains the queue into an `EventSink`, logging and counting every
//! delivery failure.

pub mod config;
pub mod queue;
pub mod rest_proxy;
pub mod sink;
pub mod worker;

pub use config::PublisherConfig;
pub use queue::{start_publisher, PublishRunnable, PublishTask, PublishWorker, QueuedPublisher};
pub use rest_proxy::KafkaRestSink;
pub use sink::{EventSink, LogSink};
pub use worker::{BackgroundRunnable, BackgroundWorker};
