//! LLM-backed structured extraction.

pub mod config;
pub mod mistral;

pub use config::ExtractorConfig;
pub use mistral::MistralExtractor;
