//! PII scrubbing rules.
//!
//! Removes personally identifiable patterns from normalized text before it
//! reaches classification or storage of the derived form. The raw payload is
//! kept verbatim; only `normalized_text` is scrubbed.

use regex::Regex;
use std::sync::LazyLock;

/// Patterns that should be masked
static SCRUB_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Email addresses
        (
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            "[EMAIL_REDACTED]",
        ),
        // Phone numbers (US formats, with optional country code)
        (
            Regex::new(r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap(),
            "[PHONE_REDACTED]",
        ),
        // Card-like digit runs (13-16 digits with optional separators)
        (
            Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{1,4}\b").unwrap(),
            "[CARD_REDACTED]",
        ),
    ]
});

/// Mask PII patterns in text
pub fn scrub(text: &str) -> String {
    let mut result = text.to_string();

    for (pattern, replacement) in SCRUB_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    result
}

/// Check whether text contains any PII pattern
pub fn contains_pii(text: &str) -> bool {
    SCRUB_PATTERNS.iter().any(|(pattern, _)| pattern.is_match(text))
}
