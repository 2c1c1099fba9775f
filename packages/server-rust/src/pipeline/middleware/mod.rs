//! Tower middleware layers for the pipeline service.
//!
//! - [`metrics`]: Invocation timing and outcome counting via `tracing` spans and `metrics`
//! - [`load_shed`]: Semaphore-based concurrency limiting
//! - [`stack`]: Composes all layers into a single service stack

pub mod load_shed;
pub mod metrics;
pub mod stack;

pub use load_shed::LoadShedLayer;
pub use metrics::MetricsLayer;
pub use stack::{build_pipeline_stack, PipelineStack};
