//! Kafka REST Proxy (v2) event sink.
//!
//! Produces each record as an embedded JSON value:
//! `POST {base}/topics/{channel}` with body `{"records":[{"value": ...}]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use spendwire_core::PublishError;

use super::sink::EventSink;

const JSON_V2: &str = "application/vnd.kafka.json.v2+json";
const ACCEPT_V2: &str = "application/vnd.kafka.v2+json";

/// Produce response: one offset entry per record.
#[derive(Deserialize)]
struct ProduceResponse {
    #[serde(default)]
    offsets: Vec<ProduceOffset>,
}

#[derive(Deserialize)]
struct ProduceOffset {
    #[serde(default)]
    error_code: Option<i32>,
    #[serde(default)]
    error: Option<String>,
}

/// Sends records to Kafka through a REST Proxy.
pub struct KafkaRestSink {
    client: reqwest::Client,
    base_url: String,
}

impl KafkaRestSink {
    /// Create a sink for the proxy at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn topic_url(&self, channel: &str) -> String {
        format!("{}/topics/{channel}", self.base_url)
    }
}

#[async_trait]
impl EventSink for KafkaRestSink {
    async fn send(&self, channel: &str, payload: &serde_json::Value) -> Result<(), PublishError> {
        let body = serde_json::to_vec(&json!({ "records": [{ "value": payload }] }))
            .map_err(|e| PublishError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(self.topic_url(channel))
            .header(CONTENT_TYPE, JSON_V2)
            .header(ACCEPT, ACCEPT_V2)
            .body(body)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let produced: ProduceResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        if let Some(failed) = produced.offsets.iter().find(|o| o.error_code.is_some()) {
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body: failed.error.clone().unwrap_or_default(),
            });
        }

        Ok(())
    }
}
