//! Mistral chat-completions extractor.
//!
//! Sends the message text with a fixed system prompt and a strict JSON
//! schema response format, then coerces the returned content through
//! `spendwire_core::schema`. One HTTP request per call, no retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spendwire_core::schema::{self, EXPENSE_SCHEMA_NAME};
use spendwire_core::{ExpenseRecord, ExtractionError, Extractor, SchemaViolation};
use tracing::debug;

use super::config::ExtractorConfig;

/// System instruction sent ahead of every message.
pub const SYSTEM_PROMPT: &str = "You are an expert extraction algorithm. \
     Only extract relevant information from the text. \
     If you do not know the value of an attribute asked to extract, \
     return null for the attribute's value.";

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Request body for `POST /v1/chat/completions`.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    schema: Value,
    strict: bool,
}

/// Response body from `POST /v1/chat/completions`.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Value,
}

/// Structured expense extractor backed by the Mistral API.
pub struct MistralExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl MistralExtractor {
    /// Create an extractor from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialization failure).
    pub fn new(config: ExtractorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key,
            model: config.model,
            temperature: config.temperature,
            timeout: config.timeout,
        })
    }

    fn request_body<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: EXPENSE_SCHEMA_NAME,
                    schema: schema::json_schema(),
                    strict: true,
                },
            },
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn transport_error(&self, err: &reqwest::Error) -> ExtractionError {
        if err.is_timeout() {
            ExtractionError::Timeout {
                timeout_ms: self.timeout_ms(),
            }
        } else {
            ExtractionError::ServiceUnavailable {
                reason: err.to_string(),
            }
        }
    }

    async fn request(&self, text: &str) -> Result<ExpenseRecord, ExtractionError> {
        debug!(model = %self.model, endpoint = %self.endpoint, "requesting extraction");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::ServiceUnavailable {
                reason: format!("upstream returned {status}: {}", truncate(&body)),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                ExtractionError::SchemaViolation(SchemaViolation::NotJson(format!(
                    "malformed completion response: {e}"
                )))
            } else {
                self.transport_error(&e)
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| message_text(&choice.message.content))
            .ok_or_else(|| SchemaViolation::NotJson("completion has no content".to_string()))?;

        let record = schema::coerce_str(&content)?;
        debug!(empty = record.is_empty(), "extraction complete");
        Ok(record)
    }
}

#[async_trait]
impl Extractor for MistralExtractor {
    async fn extract(&self, text: &str) -> Result<ExpenseRecord, ExtractionError> {
        match tokio::time::timeout(self.timeout, self.request(text)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ExtractionError::Timeout {
                timeout_ms: self.timeout_ms(),
            }),
        }
    }
}

/// Assistant content is either a string or a list of typed chunks.
fn message_text(content: &Value) -> Option<String> {
    match content {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(chunks) => {
            let text: String = chunks
                .iter()
                .filter_map(|chunk| chunk.get("text").and_then(Value::as_str))
                .collect();
            (!text.trim().is_empty()).then_some(text)
        }
        _ => None,
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::test_support::spawn_stub;

    const CHASE: &str = "Your Chase card was charged $45.00 at Target";

    fn completion(content: Value) -> Value {
        json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop",
            }],
        })
    }

    fn extractor_for(base_url: String, timeout: Duration) -> MistralExtractor {
        MistralExtractor::new(ExtractorConfig {
            base_url,
            api_key: "test-key".to_string(),
            timeout,
            ..ExtractorConfig::default()
        })
        .unwrap()
    }

    async fn stub_returning(status: StatusCode, body: Value) -> String {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        spawn_stub(router).await
    }

    #[test]
    fn message_text_handles_chunk_arrays() {
        let content = json!([
            { "type": "text", "text": "{\"amount\":" },
            { "type": "text", "text": "\"45.00\"}" },
        ]);
        assert_eq!(message_text(&content).unwrap(), "{\"amount\":\"45.00\"}");
        assert!(message_text(&Value::Null).is_none());
        assert!(message_text(&json!("  ")).is_none());
    }

    #[test]
    fn truncate_limits_long_bodies() {
        let long = "x".repeat(MAX_ERROR_BODY * 2);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }

    #[tokio::test]
    async fn sends_prompt_schema_and_credentials() {
        let captured: Arc<Mutex<Option<(HeaderMap, Value)>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&captured);
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().unwrap() = Some((headers, body));
                    Json(completion(json!(
                        "{\"amount\": \"45.00\", \"merchant\": \"Target\", \"currency\": \"USD\"}"
                    )))
                }
            }),
        );
        let base = spawn_stub(router).await;

        let record = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap();

        assert_eq!(record.amount(), Some("45.00"));
        assert_eq!(record.merchant(), Some("Target"));
        assert_eq!(record.currency(), Some("USD"));

        let (headers, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(headers["authorization"], "Bearer test-key");
        assert_eq!(body["model"], "mistral-large-latest");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], CHASE);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "Expense");
        assert_eq!(
            body["response_format"]["json_schema"]["schema"],
            schema::json_schema()
        );
    }

    #[tokio::test]
    async fn trailing_slash_base_url_is_joined() {
        let base = stub_returning(
            StatusCode::OK,
            completion(json!("{\"amount\": \"45.00\", \"merchant\": \"Target\", \"currency\": \"USD\"}")),
        )
        .await;

        let record = extractor_for(format!("{base}/"), Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap();

        assert_eq!(record.merchant(), Some("Target"));
    }

    #[tokio::test]
    async fn null_fields_are_not_an_error() {
        let base = stub_returning(
            StatusCode::OK,
            completion(json!("{\"amount\": null, \"merchant\": null, \"currency\": null}")),
        )
        .await;

        let record = extractor_for(base, Duration::from_secs(5))
            .extract("debited INR")
            .await
            .unwrap();

        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn auth_failure_is_service_unavailable() {
        let base = stub_returning(
            StatusCode::UNAUTHORIZED,
            json!({ "message": "Unauthorized" }),
        )
        .await;

        let err = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        match err {
            ExtractionError::ServiceUnavailable { reason } => assert!(reason.contains("401")),
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_service_unavailable() {
        let base = stub_returning(StatusCode::BAD_GATEWAY, json!({})).await;

        let err = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "service_unavailable");
    }

    #[tokio::test]
    async fn unreachable_service_is_service_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = extractor_for(format!("http://{addr}"), Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "service_unavailable");
    }

    #[tokio::test]
    async fn prose_content_is_schema_violation() {
        let base = stub_returning(
            StatusCode::OK,
            completion(json!("The merchant appears to be Target.")),
        )
        .await;

        let err = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::SchemaViolation(SchemaViolation::NotJson(_))
        ));
    }

    #[tokio::test]
    async fn wrong_field_type_is_schema_violation() {
        let base = stub_returning(
            StatusCode::OK,
            completion(json!("{\"amount\": [45], \"merchant\": \"Target\"}")),
        )
        .await;

        let err = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExtractionError::SchemaViolation(SchemaViolation::FieldType {
                field: "amount",
                found: "array",
            })
        );
    }

    #[tokio::test]
    async fn missing_choices_is_schema_violation() {
        let base = stub_returning(StatusCode::OK, json!({ "choices": [] })).await;

        let err = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "schema_violation");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_schema_violation() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::OK, "<html>upstream maintenance</html>") }),
        );
        let base = spawn_stub(router).await;

        let err = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::SchemaViolation(SchemaViolation::NotJson(_))
        ));
    }

    #[tokio::test]
    async fn malformed_envelope_is_schema_violation() {
        let base = stub_returning(StatusCode::OK, json!({ "choices": "none" })).await;

        let err = extractor_for(base, Duration::from_secs(5))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "schema_violation");
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(completion(json!("{}")))
            }),
        );
        let base = spawn_stub(router).await;

        let err = extractor_for(base, Duration::from_millis(50))
            .extract(CHASE)
            .await
            .unwrap_err();

        assert_eq!(err, ExtractionError::Timeout { timeout_ms: 50 });
    }
}
