//! Core error type

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors raised while shaping, sending or decoding an evaluation call.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The provider identifier has no known wire dialect.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The transport failed or the provider answered with a non-2xx status.
    ///
    /// `status` is `None` when no HTTP response was received at all.
    #[error("Provider call failed{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    ProviderCall {
        status: Option<u16>,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// The call succeeded but the reply could not be decoded into a JSON object.
    #[error("Malformed provider response: {message}")]
    MalformedResponse { message: String, raw_text: String },

    /// A submitted parameter is out of bounds or of the wrong kind.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Static reference data or runtime configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Low-level HTTP client failure (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON encoding or decoding failure outside of reply parsing.
    #[error("JSON error: {0}")]
    Json(String),
}

impl LlmError {
    /// Upstream HTTP status, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProviderCall { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw text attached for diagnosis (malformed replies only).
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw_text, .. } => Some(raw_text),
            _ => None,
        }
    }

    /// Whether an outer layer could reasonably retry the call.
    ///
    /// This crate never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProviderCall { status: None, .. } | Self::Http(_) => true,
            Self::ProviderCall {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    pub(crate) fn provider_call(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ProviderCall {
            status,
            message: message.into(),
            body: None,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            raw_text: raw_text.into(),
        }
    }
}
