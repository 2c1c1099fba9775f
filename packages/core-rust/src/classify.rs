//! Bank-SMS classification.
//!
//! A [`Classifier`] is a pure, total predicate over text. The default policy,
//! [`KeywordClassifier`], accepts a message when it carries both a
//! transaction-indicator keyword and a currency-tagged amount.

use std::sync::LazyLock;

use regex::Regex;

/// Decides whether a message is a bank transaction notification.
///
/// Implementations must be deterministic and side-effect free, and must
/// return `false` (never panic) for empty or malformed input.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> bool;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn classify(&self, text: &str) -> bool {
        self(text)
    }
}

/// Transaction-indicator keywords common to Indian, US, and European bank SMS.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "debited",
    "credited",
    "debit",
    "credit",
    "spent",
    "charged",
    "withdrawn",
    "withdrawal",
    "purchase",
    "paid",
    "payment",
    "txn",
    "transaction",
    "transferred",
    "a/c",
    "acct",
    "account",
    "card",
    "bank",
    "upi",
    "atm",
];

/// Currency codes accepted as an amount prefix or suffix.
const CURRENCY_CODES: &str = "inr|rs|usd|eur|gbp|aed|sgd|cad|aud|jpy|chf";

static DEFAULT_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    keyword_regex(DEFAULT_KEYWORDS).expect("default keyword list is a valid pattern")
});

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    let number = r"[0-9][0-9,]*(?:\.[0-9]+)?";
    Regex::new(&format!(
        r"(?i)(?:\b(?:{CURRENCY_CODES})\.?\s*|[₹$€£¥]\s*){number}|{number}\s*(?:\b(?:{CURRENCY_CODES})\b|[₹$€£¥])"
    ))
    .expect("amount pattern is valid")
});

fn keyword_regex(keywords: &[&str]) -> Result<Regex, regex::Error> {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(?:^|\W)(?:{alternation})(?:\W|$)"))
}

/// Keyword + amount heuristic for bank transaction messages.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Regex,
}

impl KeywordClassifier {
    /// Builds a classifier with a custom keyword list.
    ///
    /// Keywords match case-insensitively on non-word boundaries, so entries
    /// such as `a/c` work as expected.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined pattern exceeds the regex size limit.
    pub fn with_keywords(keywords: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            keywords: keyword_regex(keywords)?,
        })
    }

    /// True if `text` contains a transaction-indicator keyword.
    #[must_use]
    pub fn has_keyword(&self, text: &str) -> bool {
        self.keywords.is_match(text)
    }

    /// True if `text` contains a currency-tagged amount such as `INR 1200`,
    /// `Rs.500`, `$45.00`, or `12.50 EUR`.
    #[must_use]
    pub fn has_amount(text: &str) -> bool {
        AMOUNT_RE.is_match(text)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORD_RE.clone(),
        }
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.has_keyword(text) && Self::has_amount(text)
    }
}
