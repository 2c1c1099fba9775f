//! Command-line and environment configuration for the server binary.
//!
//! `ServerArgs` is the only place flags and environment variables are read.
//! It converts into the plain config structs each module takes, so nothing
//! below the binary depends on clap.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::extract::ExtractorConfig;
use crate::network::NetworkConfig;
use crate::pipeline::PipelineConfig;
use crate::publish::PublisherConfig;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Bank-SMS expense extraction server.
#[derive(Debug, Parser)]
#[command(name = "spendwire-server", version, about, args_override_self = true)]
pub struct ServerArgs {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to listen on (0 picks a free port).
    #[arg(long, env = "PORT", default_value_t = 8010)]
    pub port: u16,

    /// API key for the Mistral chat-completions API.
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    pub mistral_api_key: String,
    #[arg(long, env = "MISTRAL_BASE_URL", default_value = "https://api.mistral.ai")]
    pub mistral_base_url: String,
    #[arg(long, env = "MISTRAL_MODEL", default_value = "mistral-large-latest")]
    pub model: String,
    #[arg(long, default_value_t = 0.0)]
    pub temperature: f32,
    /// Upper bound on one extraction call, in milliseconds.
    #[arg(long, env = "EXTRACTION_TIMEOUT_MS", default_value_t = 20_000, value_parser = parse_positive_u64)]
    pub extraction_timeout_ms: u64,

    /// Upper bound on one HTTP request, in milliseconds.
    #[arg(long, default_value_t = 30_000, value_parser = parse_positive_u64)]
    pub request_timeout_ms: u64,
    /// How long shutdown waits for in-flight requests, in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    pub drain_timeout_ms: u64,
    /// Pipeline invocations allowed in flight before answering 503.
    #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_concurrent: u32,
    /// Allowed CORS origin. Repeat for several; omit to allow any.
    #[arg(long = "cors-origin", action = ArgAction::Append)]
    pub cors_origins: Vec<String>,

    /// Kafka REST Proxy base URL. An empty value logs records instead.
    #[arg(long, env = "KAFKA_REST_URL", default_value = "http://localhost:8082")]
    pub kafka_rest_url: String,
    /// Records buffered for delivery before new ones are dropped.
    #[arg(long, default_value_t = 1024, value_parser = parse_capacity)]
    pub publish_queue_capacity: usize,
    /// How long shutdown waits for queued records to be delivered, in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    pub publish_flush_timeout_ms: u64,

    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `spendwire_server=debug`).
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl ServerArgs {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            drain_timeout: Duration::from_millis(self.drain_timeout_ms),
        }
    }

    #[must_use]
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            base_url: self.mistral_base_url.clone(),
            api_key: self.mistral_api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: Duration::from_millis(self.extraction_timeout_ms),
            ..ExtractorConfig::default()
        }
    }

    #[must_use]
    pub fn publisher_config(&self) -> PublisherConfig {
        let rest_url = self.kafka_rest_url.trim();
        PublisherConfig {
            rest_url: (!rest_url.is_empty()).then(|| rest_url.to_string()),
            queue_capacity: self.publish_queue_capacity,
            flush_timeout: Duration::from_millis(self.publish_flush_timeout_ms),
            ..PublisherConfig::default()
        }
    }

    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_concurrent: self.max_concurrent,
        }
    }
}

fn parse_positive_u64(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(v) => Ok(v),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_capacity(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("queue capacity must be at least 1".to_string()),
        Ok(v) => Ok(v),
        Err(e) => Err(e.to_string()),
    }
}
