use crate::record::ExpenseRecord;
use crate::schema::SchemaViolation;

/// Failure of a single extraction call. Never retried by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// Network, TLS, auth, or upstream-status failure reaching the model.
    #[error("extraction service unavailable: {reason}")]
    ServiceUnavailable { reason: String },
    /// The model answered, but not in the expense schema.
    #[error("extraction response violates schema: {0}")]
    SchemaViolation(#[from] SchemaViolation),
    #[error("extraction timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl ExtractionError {
    /// Stable label for logs, metrics, and response headers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::SchemaViolation(_) => "schema_violation",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Failure handing a serialized record to the publish boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("publish queue for channel `{channel}` is full")]
    QueueFull { channel: String },
    #[error("publisher is shut down")]
    Closed,
    #[error("failed to encode payload: {0}")]
    Encode(String),
    #[error("event sink unreachable: {0}")]
    Transport(String),
    #[error("event sink rejected payload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl PublishError {
    /// Stable label for logs and metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::QueueFull { .. } => "queue_full",
            Self::Closed => "closed",
            Self::Encode(_) => "encode",
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
        }
    }
}

/// Result of one pipeline invocation.
///
/// `Rejected` is the normal answer for text that is not a bank message and
/// never involves the extractor. `ExtractionFailed` means the text looked
/// like a bank message but no record could be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Published(ExpenseRecord),
    Rejected,
    ExtractionFailed(ExtractionError),
}

impl PipelineOutcome {
    /// Stable label for logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published(_) => "published",
            Self::Rejected => "rejected",
            Self::ExtractionFailed(_) => "extraction_failed",
        }
    }
}
