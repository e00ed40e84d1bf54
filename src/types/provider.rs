//! Provider identifiers and wire dialects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A provider as named by the caller.
///
/// Parsing is total: anything that is not a known provider becomes
/// [`ProviderId::Other`], which the resolver still serves and the adapter
/// rejects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderId {
    Anthropic,
    OpenAi,
    Gemini,
    DeepSeek,
    Qwen,
    Kimi,
    Other(String),
}

/// Request/response shape spoken by a provider endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Chat Completions (`messages`, `choices[0].message.content`)
    OpenAi,
    /// Messages API (`messages`, `content[0].text`)
    Anthropic,
    /// generateContent (`contents[].parts[]`, `candidates[0].content.parts[0].text`)
    Gemini,
}

impl ProviderId {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Self::Anthropic,
            "openai" => Self::OpenAi,
            "gemini" => Self::Gemini,
            "deepseek" => Self::DeepSeek,
            "qwen" => Self::Qwen,
            "kimi" => Self::Kimi,
            _ => Self::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
            Self::Qwen => "qwen",
            Self::Kimi => "kimi",
            Self::Other(name) => name,
        }
    }

    /// Wire dialect, or `None` for providers the adapter cannot call.
    pub const fn dialect(&self) -> Option<Dialect> {
        match self {
            Self::Anthropic => Some(Dialect::Anthropic),
            Self::Gemini => Some(Dialect::Gemini),
            Self::OpenAi | Self::DeepSeek | Self::Qwen | Self::Kimi => Some(Dialect::OpenAi),
            Self::Other(_) => None,
        }
    }

    /// All providers with a dialect, in display order.
    pub fn known() -> [ProviderId; 6] {
        [
            Self::OpenAi,
            Self::Anthropic,
            Self::Gemini,
            Self::DeepSeek,
            Self::Qwen,
            Self::Kimi,
        ]
    }
}

impl FromStr for ProviderId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ProviderId> for String {
    fn from(value: ProviderId) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
