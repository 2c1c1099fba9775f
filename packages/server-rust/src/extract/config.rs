use std::time::Duration;

/// Connection and model settings for the extraction service.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Base URL of the chat-completions API, without the `/v1/...` path.
    pub base_url: String,
    /// Bearer token for the API.
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on one extraction call, connect through response body.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mistral.ai".to_string(),
            api_key: String::new(),
            model: "mistral-large-latest".to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(5),
        }
    }
}
