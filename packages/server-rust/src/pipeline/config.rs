/// Configuration for the pipeline service stack.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of in-flight invocations before load shedding.
    pub max_concurrent: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 256,
        }
    }
}
