//! Message pipeline and the tower stack that serves it.
//!
//! 1. **Orchestration** (`orchestrator`): classify → extract → publish, returning a `PipelineOutcome`
//! 2. **Service** (`service`): `tower::Service<RawMessage>` adapter over a shared `Pipeline`
//! 3. **Middleware** (`middleware`): Tower layers (metrics, load-shedding)

pub mod config;
pub mod middleware;
pub mod orchestrator;
pub mod service;

pub use config::PipelineConfig;
pub use middleware::{build_pipeline_stack, PipelineStack};
pub use orchestrator::Pipeline;
pub use service::{PipelineError, PipelineService};
