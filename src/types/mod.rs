//! Core data types
//!
//! Provider identity, submitted parameter values, evaluation request/result
//! shapes and token usage records.

pub mod evaluation;
pub mod params;
pub mod provider;
pub mod usage;

pub use evaluation::{EvaluationRequest, EvaluationResult, PayloadPreview, TokenUsage};
pub use params::{ParamMap, ParamValue, param_map_from_json};
pub use provider::{Dialect, ProviderId};
pub use usage::{InMemoryUsageSink, TokenUsageEntry, UsageRecord, UsageSink, UsageStatus};
