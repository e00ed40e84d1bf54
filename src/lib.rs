//! # RedGuard
//!
//! Building blocks for LLM-judged guardrail evaluation:
//!
//! - [`hyperparams`]: which sampling knobs a provider/model family accepts,
//!   their bounds and defaults, and which knobs lock each other out
//! - [`evaluator`]: turns one evaluation request into exactly one provider
//!   call (OpenAI, Anthropic, Gemini and OpenAI-compatible endpoints) and
//!   normalizes the reply into parsed JSON plus token usage
//! - [`pricing`]: estimates the USD cost of recorded token usage from a
//!   reference price table
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use redguard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LlmError> {
//!     let evaluator = Evaluator::new(EvaluatorConfig::from_env()?)?;
//!     let request = EvaluationRequest::new("anthropic", std::env::var("ANTHROPIC_API_KEY").unwrap(), "Rate this reply ...")
//!         .with_model("claude-sonnet-4-5-20250929")
//!         .with_param("temperature", 0.2);
//!
//!     let result = evaluator.evaluate(&request).await?;
//!     println!("{:?} in {:?}", result.parsed, result.latency);
//!
//!     let cost = PricingEstimator::builtin()?.estimate(&[TokenUsageEntry::from(&result.usage_record())]);
//!     println!("~${}", cost.total_estimate);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod hyperparams;
pub mod pricing;
pub mod providers;
pub mod server_adapters;
pub mod telemetry;
pub mod transport;
pub mod types;

pub use config::{DefaultHyperparams, EvaluatorConfig};
pub use error::{LlmError, Result, describe_failure};
pub use evaluator::Evaluator;
pub use hyperparams::{ModelConfiguration, defaults_of, resolve};
pub use pricing::{CostEstimate, PricingEstimator};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{DefaultHyperparams, EvaluatorConfig};
    pub use crate::error::{LlmError, describe_failure};
    pub use crate::evaluator::Evaluator;
    pub use crate::hyperparams::{ModelConfiguration, ParameterDefinition, defaults_of, resolve};
    pub use crate::pricing::{CostEstimate, CostLine, PricingEstimator};
    pub use crate::transport::{HttpCall, HttpReply, ReqwestTransport, Transport};
    pub use crate::types::{
        EvaluationRequest, EvaluationResult, ParamMap, ParamValue, PayloadPreview, ProviderId,
        TokenUsage, TokenUsageEntry, UsageRecord, UsageSink,
    };
}
