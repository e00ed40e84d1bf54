//! Provider dialects
//!
//! Each dialect module knows how to shape a request body, where to send it,
//! which headers carry the credential, and how to pull text and token usage
//! back out of the reply. [`Dialect`] dispatches to them.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod utils;

use reqwest::header::HeaderMap;
use secrecy::SecretString;
use serde_json::Value;

use crate::error::LlmError;
use crate::types::{Dialect, ParamMap, ProviderId};
pub use utils::ParsedReply;

impl Dialect {
    /// Dialect for a provider, or `UnsupportedProvider`.
    pub fn for_provider(provider: &ProviderId) -> Result<Self, LlmError> {
        provider
            .dialect()
            .ok_or_else(|| LlmError::UnsupportedProvider(provider.to_string()))
    }

    pub fn build_payload(self, model: &str, prompt: &str, params: &ParamMap) -> Value {
        match self {
            Self::OpenAi => openai::build_payload(model, prompt, params),
            Self::Anthropic => anthropic::build_payload(model, prompt, params),
            Self::Gemini => gemini::build_payload(prompt, params),
        }
    }

    pub fn endpoint(self, base_url: &str, model: &str) -> String {
        match self {
            Self::OpenAi => openai::endpoint(base_url),
            Self::Anthropic => anthropic::endpoint(base_url),
            Self::Gemini => gemini::endpoint(base_url, model),
        }
    }

    pub fn headers(self, credential: &SecretString) -> Result<HeaderMap, LlmError> {
        match self {
            Self::OpenAi => openai::headers(credential),
            Self::Anthropic => anthropic::headers(credential),
            Self::Gemini => gemini::headers(credential),
        }
    }

    pub fn parse_reply(self, body: &Value) -> Result<ParsedReply, LlmError> {
        match self {
            Self::OpenAi => openai::parse_reply(body),
            Self::Anthropic => anthropic::parse_reply(body),
            Self::Gemini => gemini::parse_reply(body),
        }
    }

    /// Sampling values recovered from a hand-edited payload.
    pub fn params_from_payload(self, payload: &Value) -> ParamMap {
        match self {
            Self::OpenAi => openai::params_from_payload(payload),
            Self::Anthropic => anthropic::params_from_payload(payload),
            Self::Gemini => gemini::params_from_payload(payload),
        }
    }
}

/// Public API root of a provider, before any endpoint path.
pub fn default_base_url(provider: &ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::OpenAi => Some("https://api.openai.com/v1"),
        ProviderId::Anthropic => Some("https://api.anthropic.com/v1"),
        ProviderId::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
        ProviderId::DeepSeek => Some("https://api.deepseek.com/v1"),
        ProviderId::Qwen => Some("https://dashscope-intl.aliyuncs.com/compatible-mode/v1"),
        ProviderId::Kimi => Some("https://api.moonshot.ai/v1"),
        ProviderId::Other(_) => None,
    }
}

/// Model used when the request does not name one.
pub fn default_model(provider: &ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::OpenAi => Some("gpt-4o"),
        ProviderId::Anthropic => Some("claude-sonnet-4-5-20250929"),
        ProviderId::Gemini => Some("gemini-2.5-pro-preview-06-05"),
        ProviderId::DeepSeek => Some("deepseek-chat"),
        ProviderId::Qwen => Some("qwen-plus"),
        ProviderId::Kimi => Some("moonshot-v1-8k"),
        ProviderId::Other(_) => None,
    }
}
