//! Evaluation request and normalized result

use secrecy::SecretString;
use serde::Serialize;
use std::time::Duration;

use super::params::{ParamMap, ParamValue};
use super::provider::ProviderId;
use super::usage::{UsageRecord, UsageStatus};

/// One "evaluate with an LLM" call as submitted by the caller.
///
/// The credential is opaque to this crate; it is only exposed while building
/// request headers or URLs and is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub provider: ProviderId,
    /// Model identifier; `None` or empty selects the provider's default model
    pub model: Option<String>,
    pub credential: SecretString,
    pub prompt: String,
    pub params: ParamMap,
    /// Hand-edited payload sent verbatim instead of the built one
    pub override_payload: Option<serde_json::Value>,
}

impl EvaluationRequest {
    pub fn new(
        provider: impl Into<ProviderId>,
        credential: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: None,
            credential: SecretString::from(credential.into()),
            prompt: prompt.into(),
            params: ParamMap::new(),
            override_payload: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: ParamMap) -> Self {
        self.params = params;
        self
    }

    pub fn with_override_payload(mut self, payload: serde_json::Value) -> Self {
        self.override_payload = Some(payload);
        self
    }

    /// Model identifier when one was actually given.
    pub fn model_hint(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// Token usage as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub total_tokens: u64,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn total(total_tokens: u64) -> Self {
        Self {
            total_tokens,
            input_tokens: None,
            output_tokens: None,
        }
    }

    pub fn split(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            total_tokens: input_tokens.saturating_add(output_tokens),
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
        }
    }
}

/// Normalized outcome of a successful evaluation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub provider: ProviderId,
    /// Model actually used (after default-model substitution)
    pub model: String,
    /// Structured content decoded from the reply text
    pub parsed: serde_json::Map<String, serde_json::Value>,
    /// Reply text exactly as returned, fences included
    pub raw_text: String,
    /// `None` when the provider did not report usage at all
    pub usage: Option<TokenUsage>,
    #[serde(serialize_with = "serialize_millis")]
    pub latency: Duration,
    /// Exact outbound payload
    pub request_payload: serde_json::Value,
    /// Exact inbound body
    pub raw_response: serde_json::Value,
    /// Effective hyperparameters after defaults were applied
    pub hyperparams: ParamMap,
}

impl EvaluationResult {
    /// Token count, absent when the provider reported no usage.
    pub fn total_tokens(&self) -> Option<u64> {
        self.usage.map(|u| u.total_tokens)
    }

    /// Record for the caller's usage-log sink.
    pub fn usage_record(&self) -> UsageRecord {
        UsageRecord::new(
            self.provider.clone(),
            self.model.clone(),
            UsageStatus::Success,
            self.latency,
        )
        .with_usage(self.usage)
    }
}

/// Payload that would be sent for a request, without performing the call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadPreview {
    pub provider: ProviderId,
    pub model: String,
    pub url: String,
    pub payload: serde_json::Value,
    pub prompt: String,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn debug_output_redacts_credential() {
        let req = EvaluationRequest::new("openai", "sk-very-secret", "hello");
        let dbg = format!("{req:?}");
        assert!(!dbg.contains("sk-very-secret"));
        assert_eq!(req.credential.expose_secret(), "sk-very-secret");
    }

    #[test]
    fn blank_model_is_treated_as_absent() {
        let req = EvaluationRequest::new("gemini", "k", "p").with_model("  ");
        assert_eq!(req.model_hint(), None);
        let req = req.with_model("gemini-2.5-flash");
        assert_eq!(req.model_hint(), Some("gemini-2.5-flash"));
    }

    #[test]
    fn split_usage_sums_total() {
        let usage = TokenUsage::split(120, 30);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(TokenUsage::total(9).input_tokens, None);
    }

    #[test]
    fn split_usage_saturates_on_huge_counts() {
        let usage = TokenUsage::split(u64::MAX, 1);
        assert_eq!(usage.total_tokens, u64::MAX);
        assert_eq!(usage.output_tokens, Some(1));
    }
}
