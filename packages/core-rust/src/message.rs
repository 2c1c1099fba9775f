/// Unstructured inbound text, one per request. Never persisted.
///
/// No non-empty check is made here: an empty body is a valid input that the
/// classifier simply rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    body: String,
}

impl RawMessage {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// The message text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl From<String> for RawMessage {
    fn from(body: String) -> Self {
        Self { body }
    }
}

impl From<&str> for RawMessage {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}
