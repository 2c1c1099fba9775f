//! HTTP handler definitions for the expense server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports the handler functions used by the router.

pub mod message;

pub use message::{
    message_handler, MessageRequest, EXTRACTION_ERROR_HEADER, MESSAGE_ROUTE, OUTCOME_HEADER,
};

use std::sync::Arc;

use super::ShutdownController;
use crate::pipeline::PipelineStack;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Cloning is cheap: the pipeline stack shares its `Pipeline` and
/// concurrency limit across clones.
#[derive(Clone)]
pub struct AppState {
    /// Layered pipeline service (load shedding, metrics, orchestrator).
    pub pipeline: PipelineStack,
    /// Graceful shutdown controller with in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
}
