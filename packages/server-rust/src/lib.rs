//! `Spendwire` Server: HTTP front end that turns bank SMS text into expense
//! records via an LLM and publishes them to an event stream.

pub mod app;
pub mod config;
pub mod extract;
pub mod network;
pub mod pipeline;
pub mod publish;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use config::ServerArgs;
pub use pipeline::{Pipeline, PipelineStack};
