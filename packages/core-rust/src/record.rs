use serde::{Deserialize, Serialize};

/// Structured expense extracted from a bank transaction message.
///
/// Every field is independently optional: the extraction model returns null
/// for anything it could not determine, and that is not an error. Records are
/// immutable once built; fields are exposed through accessors only.
///
/// Wire shape (publish payload and success response body):
///
/// ```json
/// { "amount": "1200", "merchant": "Amazon", "currency": "INR" }
/// ```
///
/// Absent values serialize as explicit `null`, never as missing keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    amount: Option<String>,
    merchant: Option<String>,
    currency: Option<String>,
}

impl ExpenseRecord {
    #[must_use]
    pub fn new(
        amount: Option<String>,
        merchant: Option<String>,
        currency: Option<String>,
    ) -> Self {
        Self {
            amount,
            merchant,
            currency,
        }
    }

    /// Transaction amount as decimal text, e.g. `"45.00"`.
    #[must_use]
    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    #[must_use]
    pub fn merchant(&self) -> Option<&str> {
        self.merchant.as_deref()
    }

    /// Currency as produced by extraction: usually an ISO code, sometimes a symbol.
    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// True when extraction found nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.merchant.is_none() && self.currency.is_none()
    }

    /// Serializes the record into its fixed JSON wire shape.
    #[must_use]
    pub fn serialize(&self) -> serde_json::Value {
        serde_json::json!({
            "amount": self.amount,
            "merchant": self.merchant,
            "currency": self.currency,
        })
    }

    /// Parses a record back out of its wire shape.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not an object or a field is not a
    /// string or null.
    pub fn deserialize(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        <Self as Deserialize>::deserialize(value)
    }
}
