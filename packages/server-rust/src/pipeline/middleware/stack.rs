//! Stack composition: wraps the pipeline service with all middleware layers.

use std::sync::Arc;

use tower::ServiceBuilder;

use super::load_shed::{LoadShedLayer, LoadShedService};
use super::metrics::{MetricsLayer, MetricsService};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::orchestrator::Pipeline;
use crate::pipeline::service::PipelineService;

/// The fully layered pipeline service. Cheap to clone; every clone shares the
/// same pipeline and concurrency limit.
pub type PipelineStack = LoadShedService<MetricsService<PipelineService>>;

/// Build the pipeline stack by wrapping the `Pipeline` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded (fail fast before doing any work)
/// 2. `MetricsLayer` -- record timing and outcome (closest to the actual handler)
#[must_use]
pub fn build_pipeline_stack(pipeline: Arc<Pipeline>, config: &PipelineConfig) -> PipelineStack {
    ServiceBuilder::new()
        .layer(LoadShedLayer::new(config.max_concurrent))
        .layer(MetricsLayer)
        .service(PipelineService::new(pipeline))
}
