//! Extract a JSON payload from possibly-annotated model output
//!
//! Language models asked for "JSON only" still wrap replies in markdown code
//! fences often enough that every parse site needs the same stripping logic.
//! Isolating it here keeps the network code free of text munging and makes
//! the behavior testable against fixed strings.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum JsonExtractError {
    #[error("model reply was empty")]
    Empty,

    #[error("model reply is not valid JSON: {0}")]
    Invalid(String),
}

/// Strip markdown code fences and parse the remainder as JSON.
pub fn extract_json_payload(raw: &str) -> Result<serde_json::Value, JsonExtractError> {
    let stripped = strip_code_fences(raw);

    if stripped.is_empty() {
        return Err(JsonExtractError::Empty);
    }

    serde_json::from_str(stripped).map_err(|e| JsonExtractError::Invalid(e.to_string()))
}

/// Remove a surrounding ```json ... ``` or ``` ... ``` fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let value = extract_json_payload(r#"{"severity": 7}"#).unwrap();
        assert_eq!(value["severity"], 7);
    }

    #[test]
    fn test_json_fence() {
        let raw = "```json\n{\"severity\": 7, \"isRelevant\": true}\n```";
        let value = extract_json_payload(raw).unwrap();
        assert_eq!(value["severity"], 7);
        assert_eq!(value["isRelevant"], true);
    }

    #[test]
    fn test_bare_fence() {
        let raw = "```\n{\"category\": \"Road\"}\n```";
        let value = extract_json_payload(raw).unwrap();
        assert_eq!(value["category"], "Road");
    }

    #[test]
    fn test_surrounding_whitespace() {
        let value = extract_json_payload("  \n {\"x\": 1} \n ").unwrap();
        assert_eq!(value["x"], 1);
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(extract_json_payload(""), Err(JsonExtractError::Empty));
        assert_eq!(extract_json_payload("```json\n```"), Err(JsonExtractError::Empty));
    }

    #[test]
    fn test_non_json_reply() {
        let err = extract_json_payload("Sure! Here is my analysis.").unwrap_err();
        assert!(matches!(err, JsonExtractError::Invalid(_)));
    }
}
