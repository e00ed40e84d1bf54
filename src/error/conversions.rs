//! Type Conversions for LlmError
//!
//! From implementations for the error types the crate's dependencies raise.

use super::types::LlmError;

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<regex::Error> for LlmError {
    fn from(err: regex::Error) -> Self {
        Self::Configuration(format!("invalid model pattern: {err}"))
    }
}

impl From<validator::ValidationErrors> for LlmError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::Json(_)));
    }

    #[test]
    fn test_from_regex_error() {
        let regex_err = regex::Regex::new("gpt-(").unwrap_err();
        let llm_err: LlmError = regex_err.into();
        assert!(matches!(llm_err, LlmError::Configuration(msg) if msg.contains("invalid model pattern")));
    }
}
