//! Spam and shape validation for issue submissions
//!
//! Runs before any external call or database write: a submission that fails
//! here never costs an AI request or an image upload. Rules are checked
//! fail-fast; the first failure is the rejection reason.

use once_cell::sync::Lazy;
use regex::Regex;

const MIN_TITLE_LENGTH: usize = 5;
const MAX_TITLE_LENGTH: usize = 200;
const MIN_DESCRIPTION_LENGTH: usize = 10;
const MAX_DESCRIPTION_LENGTH: usize = 1000;

static SPAM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Only special characters
        Regex::new(r"^[^a-zA-Z0-9\s]+$").unwrap(),
        // Promotional vocabulary
        Regex::new(r"(?i)\b(buy|sell|cheap|free|click|visit|website|link|promo|discount|offer)\b")
            .unwrap(),
        // Scam vocabulary
        Regex::new(r"(?i)\b(viagra|casino|lottery|prize|winner|congratulations)\b").unwrap(),
        // URLs
        Regex::new(r"(?i)https?://").unwrap(),
        // Long number sequences (phone numbers, etc)
        Regex::new(r"\b\d{10,}\b").unwrap(),
    ]
});

/// Content validator for issue title and description
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentValidator;

impl ContentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate both fields; the first failing rule is returned
    pub fn validate(&self, title: &str, description: &str) -> Result<(), String> {
        self.validate_title(title)?;
        self.validate_description(description)
    }

    fn validate_title(&self, title: &str) -> Result<(), String> {
        let title = title.trim();

        if title.len() < MIN_TITLE_LENGTH {
            return Err(format!(
                "Title must be at least {} characters long",
                MIN_TITLE_LENGTH
            ));
        }

        if title.len() > MAX_TITLE_LENGTH {
            return Err(format!(
                "Title must not exceed {} characters",
                MAX_TITLE_LENGTH
            ));
        }

        if contains_spam(title) {
            return Err(
                "Title contains inappropriate or spam content. Please provide a genuine issue title."
                    .to_string(),
            );
        }

        if meaningful_word_count(title) < 2 {
            return Err("Title must contain at least 2 meaningful words".to_string());
        }

        Ok(())
    }

    fn validate_description(&self, description: &str) -> Result<(), String> {
        let description = description.trim();

        if description.len() < MIN_DESCRIPTION_LENGTH {
            return Err(format!(
                "Description must be at least {} characters long",
                MIN_DESCRIPTION_LENGTH
            ));
        }

        if description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(format!(
                "Description must not exceed {} characters",
                MAX_DESCRIPTION_LENGTH
            ));
        }

        if contains_spam(description) {
            return Err(
                "Description contains inappropriate or spam content. Please provide a genuine issue description."
                    .to_string(),
            );
        }

        if meaningful_word_count(description) < 3 {
            return Err("Description must contain at least 3 meaningful words".to_string());
        }

        Ok(())
    }
}

fn contains_spam(text: &str) -> bool {
    let trimmed = text.trim();

    if trimmed.len() < 3 {
        return true;
    }

    if has_repeated_run(trimmed, 5) {
        return true;
    }

    SPAM_PATTERNS.iter().any(|pattern| pattern.is_match(trimmed))
}

/// Whether the text contains a run of `min_run` or more identical
/// characters (aaaaa, 11111), case-insensitive
fn has_repeated_run(text: &str, min_run: usize) -> bool {
    let mut run = 0;
    let mut previous = None;

    for ch in text.chars().flat_map(|c| c.to_lowercase()) {
        if Some(ch) == previous {
            run += 1;
            if run >= min_run {
                return true;
            }
        } else {
            previous = Some(ch);
            run = 1;
        }
    }

    false
}

/// Words longer than 2 characters count as meaningful
fn meaningful_word_count(text: &str) -> usize {
    text.split_whitespace().filter(|w| w.len() > 2).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ContentValidator {
        ContentValidator::new()
    }

    #[test]
    fn test_short_title_rejected() {
        let err = validator().validate("ok", "A genuine pothole description").unwrap_err();
        assert!(err.contains("at least 5 characters"));
    }

    #[test]
    fn test_valid_submission_accepted() {
        assert!(validator()
            .validate("Road is very bad", "Large pothole near the bus stop on MG Road")
            .is_ok());
    }

    #[test]
    fn test_url_in_description_rejected() {
        let err = validator()
            .validate(
                "Road is very bad",
                "Check the pothole photos at https://example.com/potholes please",
            )
            .unwrap_err();
        assert!(err.contains("Description contains inappropriate or spam content"));
    }

    #[test]
    fn test_repeated_characters_rejected() {
        let err = validator()
            .validate("Heeeeelp with road", "A genuine pothole description here")
            .unwrap_err();
        assert!(err.contains("Title contains"));
    }

    #[test]
    fn test_all_patterns_compile_and_match_plain_text() {
        // Forces the lazy regex set to build; no pattern may fail to parse
        assert!(!contains_spam("Large pothole near the bus stop"));
        assert!(contains_spam("aaaaaa road issue"));
    }

    #[test]
    fn test_repeated_run_detection() {
        assert!(has_repeated_run("aaaaa", 5));
        assert!(has_repeated_run("report 11111 now", 5));
        assert!(has_repeated_run("HeEeEe", 5));
        assert!(!has_repeated_run("aaaa", 5));
        assert!(!has_repeated_run("ababababab", 5));
        assert!(!has_repeated_run("street light", 5));
    }

    #[test]
    fn test_promo_vocabulary_rejected() {
        assert!(validator()
            .validate("Free discount offer", "Buy cheap things with this promo code now")
            .is_err());
    }

    #[test]
    fn test_long_digit_run_rejected() {
        assert!(validator()
            .validate("Broken streetlight pole", "Call me on 9876543210 about the light")
            .is_err());
    }

    #[test]
    fn test_symbols_only_description_rejected() {
        assert!(validator()
            .validate("Broken streetlight pole", "!!!???###%%%^^^")
            .is_err());
    }

    #[test]
    fn test_too_few_meaningful_words() {
        // Length passes but only one word is longer than 2 chars
        let err = validator()
            .validate("bad a", "An is to of up it go")
            .unwrap_err();
        assert!(err.contains("2 meaningful words"));

        let err = validator()
            .validate("Road is very bad", "it is so so bad aa")
            .unwrap_err();
        assert!(err.contains("3 meaningful words"));
    }

    #[test]
    fn test_fail_fast_reports_title_first() {
        // Both fields invalid; the title error must win
        let err = validator().validate("ok", "short").unwrap_err();
        assert!(err.contains("Title"));
    }
}
