//! Evaluator configuration
//!
//! Base URLs, default models, default hyperparameters and HTTP settings. All
//! of it has working defaults; environment variables and the builder only
//! override what they name.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::LlmError;
use crate::providers::{default_base_url, default_model};
use crate::types::{ParamMap, ParamValue, ProviderId};

pub const ENV_HTTP_TIMEOUT_SECS: &str = "REDGUARD_HTTP_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "REDGUARD_USER_AGENT";
pub const ENV_PRICING_FILE: &str = "REDGUARD_PRICING_FILE";

/// Hyperparameters applied under every submitted map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct DefaultHyperparams {
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,
    #[validate(range(min = 1, max = 1_000_000))]
    pub max_tokens: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub top_p: f64,
}

impl Default for DefaultHyperparams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 4096,
            top_p: 1.0,
        }
    }
}

impl DefaultHyperparams {
    /// Fresh map with the defaults overlaid by `submitted`.
    pub fn overlay(&self, submitted: &ParamMap) -> ParamMap {
        let mut values = ParamMap::new();
        values.insert("temperature".into(), ParamValue::Number(self.temperature));
        values.insert(
            "max_tokens".into(),
            ParamValue::Number(f64::from(self.max_tokens)),
        );
        values.insert("top_p".into(), ParamValue::Number(self.top_p));
        values.extend(submitted.iter().map(|(k, v)| (k.clone(), v.clone())));
        values
    }
}

/// Evaluator configuration
#[derive(Debug, Clone, Default)]
pub struct EvaluatorConfig {
    base_urls: HashMap<ProviderId, String>,
    default_models: HashMap<ProviderId, String>,
    pub default_hyperparams: DefaultHyperparams,
    pub http_timeout: Option<Duration>,
    pub user_agent: Option<String>,
    /// Pricing table to load instead of the builtin one
    pub pricing_file: Option<PathBuf>,
}

impl EvaluatorConfig {
    pub fn builder() -> EvaluatorConfigBuilder {
        EvaluatorConfigBuilder::default()
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        for provider in ProviderId::known() {
            let key = format!(
                "REDGUARD_{}_BASE_URL",
                provider.as_str().to_ascii_uppercase()
            );
            if let Some(url) = get(&key) {
                builder = builder.base_url(provider, url);
            }
        }

        if let Some(secs) = get(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                LlmError::Configuration(format!(
                    "{ENV_HTTP_TIMEOUT_SECS} must be a whole number of seconds, got {secs:?}"
                ))
            })?;
            builder = builder.http_timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = get(ENV_USER_AGENT) {
            builder = builder.user_agent(agent);
        }
        if let Some(path) = get(ENV_PRICING_FILE) {
            builder = builder.pricing_file(path);
        }

        builder.build()
    }

    /// Base URL for a provider, configured or builtin.
    pub fn base_url(&self, provider: &ProviderId) -> Option<&str> {
        self.base_urls
            .get(provider)
            .map(String::as_str)
            .or_else(|| default_base_url(provider))
    }

    /// Model used when a request names none.
    pub fn default_model(&self, provider: &ProviderId) -> Option<&str> {
        self.default_models
            .get(provider)
            .map(String::as_str)
            .or_else(|| default_model(provider))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvaluatorConfigBuilder {
    base_urls: HashMap<ProviderId, String>,
    default_models: HashMap<ProviderId, String>,
    default_hyperparams: Option<DefaultHyperparams>,
    http_timeout: Option<Duration>,
    user_agent: Option<String>,
    pricing_file: Option<PathBuf>,
}

impl EvaluatorConfigBuilder {
    pub fn base_url(mut self, provider: impl Into<ProviderId>, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider.into(), url.into());
        self
    }

    pub fn default_model(
        mut self,
        provider: impl Into<ProviderId>,
        model: impl Into<String>,
    ) -> Self {
        self.default_models.insert(provider.into(), model.into());
        self
    }

    pub fn default_hyperparams(mut self, defaults: DefaultHyperparams) -> Self {
        self.default_hyperparams = Some(defaults);
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn pricing_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pricing_file = Some(path.into());
        self
    }

    pub fn build(self) -> Result<EvaluatorConfig, LlmError> {
        let default_hyperparams = self.default_hyperparams.unwrap_or_default();
        default_hyperparams.validate()?;

        if let Some(provider) = self.base_urls.keys().find(|p| p.dialect().is_none()) {
            return Err(LlmError::Configuration(format!(
                "base URL configured for unsupported provider {provider}"
            )));
        }
        for (provider, url) in &self.base_urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(LlmError::Configuration(format!(
                    "base URL for {provider} must be http(s), got {url:?}"
                )));
            }
        }

        Ok(EvaluatorConfig {
            base_urls: self.base_urls,
            default_models: self.default_models,
            default_hyperparams,
            http_timeout: self.http_timeout,
            user_agent: self.user_agent,
            pricing_file: self.pricing_file,
        })
    }
}
