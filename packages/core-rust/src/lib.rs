//! `Spendwire` Core: expense record model, extraction schema, bank-SMS
//! classification, and the boundary traits the pipeline is assembled from.
//!
//! Nothing in this crate performs I/O. The server crate supplies the
//! network-bound `Extractor` and `Publisher` implementations.

pub mod classify;
pub mod message;
pub mod outcome;
pub mod record;
pub mod schema;
pub mod traits;

pub use classify::{Classifier, KeywordClassifier};
pub use message::RawMessage;
pub use outcome::{ExtractionError, PipelineOutcome, PublishError};
pub use record::ExpenseRecord;
pub use schema::{FieldDef, SchemaViolation, EXPENSE_FIELDS};
pub use traits::{Extractor, Publisher};

/// Event channel that extracted expense records are published to.
pub const EXPENSE_CHANNEL: &str = "expense_service";

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }

    #[test]
    fn expense_channel_name_is_fixed() {
        assert_eq!(super::EXPENSE_CHANNEL, "expense_service");
    }
}
