use std::time::Duration;

/// Settings for the publish queue and its event sink.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Kafka REST Proxy base URL. `None` logs records instead of sending them.
    pub rest_url: Option<String>,
    /// Records buffered before `submit` starts refusing.
    pub queue_capacity: usize,
    /// Per-request timeout against the REST proxy.
    pub request_timeout: Duration,
    /// How long shutdown waits for the queue to empty before dropping the rest.
    pub flush_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            rest_url: Some("http://localhost:8082".to_string()),
            queue_capacity: 1024,
            request_timeout: Duration::from_secs(10),
            flush_timeout: Duration::from_secs(30),
        }
    }
}
