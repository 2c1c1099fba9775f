//! Stand-in doubles for the pipeline boundaries, shared by unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use spendwire_core::{
    ExpenseRecord, ExtractionError, Extractor, KeywordClassifier, PublishError, Publisher,
};

use crate::pipeline::Pipeline;

pub fn hdfc_record() -> ExpenseRecord {
    ExpenseRecord::new(
        Some("1200".to_string()),
        Some("Amazon".to_string()),
        Some("INR".to_string()),
    )
}

/// Extractor that returns a fixed result and counts calls.
pub struct ScriptedExtractor {
    result: Result<ExpenseRecord, ExtractionError>,
    delay: Option<Duration>,
    pub calls: AtomicU32,
}

impl ScriptedExtractor {
    pub fn ok(record: ExpenseRecord) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(record),
            delay: None,
            calls: AtomicU32::new(0),
        })
    }

    pub fn err(error: ExtractionError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            delay: None,
            calls: AtomicU32::new(0),
        })
    }

    pub fn slow(record: ExpenseRecord, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(record),
            delay: Some(delay),
            calls: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, _text: &str) -> Result<ExpenseRecord, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Publisher that records every submission, or refuses all of them.
#[derive(Default)]
pub struct RecordingPublisher {
    pub submissions: Mutex<Vec<(String, serde_json::Value)>>,
    refuse: bool,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            submissions: Mutex::new(Vec::new()),
            refuse: true,
        })
    }

    pub fn count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn take(&self) -> Vec<(String, serde_json::Value)> {
        std::mem::take(&mut *self.submissions.lock().unwrap())
    }
}

impl Publisher for RecordingPublisher {
    fn submit(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        if self.refuse {
            return Err(PublishError::QueueFull {
                channel: channel.to_string(),
            });
        }
        self.submissions
            .lock()
            .unwrap()
            .push((channel.to_string(), payload));
        Ok(())
    }
}

pub fn pipeline_with(
    extractor: Arc<ScriptedExtractor>,
    publisher: Arc<RecordingPublisher>,
) -> Pipeline {
    Pipeline::new(Arc::new(KeywordClassifier::default()), extractor, publisher)
}

/// Serves `router` on an OS-assigned local port and returns its base URL.
pub async fn spawn_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
