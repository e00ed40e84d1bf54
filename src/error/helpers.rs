//! User-facing error helpers.
//!
//! Turns an [`LlmError`] into the short operator-facing message shown next to
//! a failed evaluation, keeping the provider's own wording when available.

use super::types::LlmError;

/// Coarse failure class for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    RateLimit,
    Server,
    Client,
    Network,
    Parsing,
    Validation,
    Unsupported,
    Unknown,
}

/// Classify an error for display.
pub fn failure_kind(err: &LlmError) -> FailureKind {
    match err {
        LlmError::ProviderCall { status: None, .. } | LlmError::Http(_) => FailureKind::Network,
        LlmError::ProviderCall {
            status: Some(code), ..
        } => match *code {
            401 | 403 => FailureKind::Auth,
            429 => FailureKind::RateLimit,
            c if c >= 500 => FailureKind::Server,
            _ => FailureKind::Client,
        },
        LlmError::MalformedResponse { .. } | LlmError::Json(_) => FailureKind::Parsing,
        LlmError::InvalidParameter(_) | LlmError::Configuration(_) => FailureKind::Validation,
        LlmError::UnsupportedProvider(_) => FailureKind::Unsupported,
    }
}

/// Render a one-line description of a failed call.
pub fn describe_failure(err: &LlmError) -> String {
    match err {
        LlmError::ProviderCall {
            status: Some(code),
            message,
            ..
        } => match *code {
            401 => format!("Authentication Failed (401): {message}. Check your API Key."),
            429 => format!("Rate Limit Exceeded (429): {message}."),
            c if c >= 500 => format!("LLM Provider Error ({c}): {message}."),
            c => format!("Request Failed ({c}): {message}"),
        },
        LlmError::ProviderCall { status: None, .. } | LlmError::Http(_) => {
            "Network Error: Could not reach LLM provider. Check internet connection.".to_string()
        }
        other => other.to_string(),
    }
}

/// Pull the most specific message out of a provider error body.
///
/// Tries `error.message`, then a string `error`, then `message`, and finally
/// falls back to the serialized body.
pub fn extract_provider_message(body: &serde_json::Value) -> String {
    if let Some(msg) = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return msg.to_string();
    }
    if let Some(msg) = body.get("error").and_then(|e| e.as_str()) {
        return msg.to_string();
    }
    if let Some(msg) = body.get("message").and_then(|m| m.as_str()) {
        return msg.to_string();
    }
    match body {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
