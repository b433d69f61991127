// src/services/lead_detector.rs
//! Contact-information detection in free-text chat messages.
//!
//! This is a coarse heuristic. Any digit run that looks like a phone number
//! (an order number, a date range written with dashes) fires it, and nothing
//! is normalised. A false positive costs one extra lead email.

use std::sync::LazyLock;

use regex::Regex;

/// Optional `+`, then at least 9 characters of digits, spaces, hyphens or
/// parentheses, starting and ending with a digit.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\-\s()]{7,}\d").expect("phone pattern is valid"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.[A-Za-z]+").expect("email pattern is valid"));

pub fn contains_phone(text: &str) -> bool {
    PHONE_RE.is_match(text)
}

pub fn contains_email(text: &str) -> bool {
    EMAIL_RE.is_match(text)
}

/// True when `text` carries something that looks like a phone number or an
/// email address.
pub fn detect(text: &str) -> bool {
    contains_email(text) || contains_phone(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_needs_nine_characters() {
        assert!(contains_phone("123456789"));
        assert!(!contains_phone("12345678"));
    }

    #[test]
    fn phone_must_end_with_digit() {
        assert!(!contains_phone("1 2 3 4 ----"));
    }
}
