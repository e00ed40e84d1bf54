//! Token usage records and the usage-log sink seam

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::evaluation::TokenUsage;
use super::provider::ProviderId;
use crate::error::{LlmError, describe_failure};

/// A recorded usage entry fed to the pricing estimator.
///
/// Counts are signed because entries come from external logs and may carry
/// zero or negative placeholders; the estimator skips those.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageEntry {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_tokens: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub input_tokens: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub output_tokens: Option<i64>,
}

/// Any JSON number, fractions truncated toward zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(n) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(i) = n.as_i64() {
        return Ok(Some(i));
    }
    if n.is_u64() {
        return Ok(Some(i64::MAX));
    }
    n.as_f64()
        .filter(|f| f.is_finite())
        .map(|f| Some(f.trunc() as i64))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid token count {n}")))
}

impl TokenUsageEntry {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, total_tokens: i64) -> Self {
        Self {
            provider: Some(provider.into()),
            model: Some(model.into()),
            total_tokens: Some(total_tokens),
            input_tokens: None,
            output_tokens: None,
        }
    }

    pub fn with_split(mut self, input_tokens: i64, output_tokens: i64) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Success,
    Error,
}

/// What the caller persists after each evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub provider: ProviderId,
    pub model: String,
    pub total_tokens: Option<u64>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub status: UsageStatus,
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    pub error_message: Option<String>,
}

impl UsageRecord {
    pub fn new(provider: ProviderId, model: String, status: UsageStatus, latency: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            provider,
            model,
            total_tokens: None,
            input_tokens: None,
            output_tokens: None,
            status,
            status_code: match status {
                UsageStatus::Success => Some(200),
                UsageStatus::Error => None,
            },
            latency_ms: latency.as_millis() as u64,
            error_message: None,
        }
    }

    /// Record for a failed call.
    pub fn failure(provider: ProviderId, model: String, err: &LlmError, latency: Duration) -> Self {
        let mut record = Self::new(provider, model, UsageStatus::Error, latency);
        record.status_code = err.status_code();
        record.error_message = Some(describe_failure(err));
        record
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        if let Some(u) = usage {
            self.total_tokens = Some(u.total_tokens);
            self.input_tokens = u.input_tokens;
            self.output_tokens = u.output_tokens;
        }
        self
    }
}

impl From<&UsageRecord> for TokenUsageEntry {
    fn from(record: &UsageRecord) -> Self {
        let signed = |v: Option<u64>| v.map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        Self {
            provider: Some(record.provider.to_string()),
            model: Some(record.model.clone()),
            total_tokens: signed(record.total_tokens),
            input_tokens: signed(record.input_tokens),
            output_tokens: signed(record.output_tokens),
        }
    }
}

/// External usage-log store.
///
/// The evaluator never writes here itself; callers persist
/// [`EvaluationResult::usage_record`](super::EvaluationResult::usage_record)
/// or [`UsageRecord::failure`] after each call.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, record: UsageRecord) -> Result<(), LlmError>;
}

/// Sink that keeps records in memory, for tests and local tooling.
#[derive(Debug, Default)]
pub struct InMemoryUsageSink {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<UsageRecord> {
        self.records.lock().await.clone()
    }

    /// Records projected into pricing input.
    pub async fn usage_entries(&self) -> Vec<TokenUsageEntry> {
        self.records.lock().await.iter().map(TokenUsageEntry::from).collect()
    }
}

#[async_trait]
impl UsageSink for InMemoryUsageSink {
    async fn record(&self, record: UsageRecord) -> Result<(), LlmError> {
        self.records.lock().await.push(record);
        Ok(())
    }
}
