//! Token cost estimation
//!
//! Estimates USD cost from recorded token usage using a reference price
//! table. Lookup order for an entry is:
//!
//! 1. the provider's pattern rows, first case-insensitive match wins
//! 2. the provider's fallback rate, labelled `"{provider} (avg)"`
//! 3. no price: the entry is listed with a null cost
//!
//! Costs use the exact input/output split when both counts are positive,
//! otherwise a blended rate from the table's default input/output ratio.

mod table;

pub use table::{IoRatio, ModelRate, PricingTable, ProviderRates, Rate};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::Serialize;

use crate::config::EvaluatorConfig;
use crate::error::LlmError;
use crate::types::TokenUsageEntry;
use table::CompiledRule;

pub const DISCLAIMER: &str = "Cost is estimated using published list prices and a blended input/output ratio. Actual costs may vary.";
pub const UNKNOWN_PROVIDER_NOTE: &str = "Unknown provider — no pricing available";

/// Entries from this provider are never priced.
const EXCLUDED_PROVIDER: &str = "kore";
const TOKENS_PER_UNIT: f64 = 1_000_000.0;

const BUILTIN_TABLE: &str = include_str!("../../data/pricing.json");

static BUILTIN: LazyLock<Result<PricingEstimator, LlmError>> =
    LazyLock::new(|| PricingEstimator::from_json_str(BUILTIN_TABLE));

/// Cost of one priced (or unpriceable) usage entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pricing: Option<String>,
    pub total_tokens: i64,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    /// `None` when no rate exists for the provider
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    /// Rounded to cents
    pub total_estimate: f64,
    /// Rounded to six decimals
    pub total_estimate_precise: f64,
    pub currency: String,
    pub breakdown: Vec<CostLine>,
    pub pricing_date: String,
    pub disclaimer: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPrice {
    pub label: String,
    #[serde(flatten)]
    pub rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderPricing {
    pub provider: String,
    pub models: Vec<ModelPrice>,
}

/// Read-only view of the loaded price table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInfo {
    pub currency: String,
    pub last_updated: String,
    pub default_ratio: IoRatio,
    pub providers: Vec<ProviderPricing>,
    pub fallbacks: BTreeMap<String, Rate>,
}

/// Rate chosen for an entry and the label it was matched under.
struct MatchedRate<'a> {
    label: std::borrow::Cow<'a, str>,
    rate: Rate,
}

/// Price table with its model patterns compiled
#[derive(Debug, Clone)]
pub struct PricingEstimator {
    table: PricingTable,
    rules: BTreeMap<String, Vec<CompiledRule>>,
}

impl PricingEstimator {
    pub fn from_table(table: PricingTable) -> Result<Self, LlmError> {
        table.check()?;
        let rules = table::compile(&table)?;
        Ok(Self { table, rules })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LlmError> {
        Self::from_table(PricingTable::from_json_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LlmError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LlmError::Configuration(format!(
                "cannot read pricing file {}: {e}",
                path.display()
            ))
        })?;
        tracing::debug!(target: "redguard::pricing", path=%path.display(), "loading pricing table");
        Self::from_json_str(&json)
    }

    /// Estimator over the pricing table shipped with the crate.
    pub fn builtin() -> Result<&'static PricingEstimator, LlmError> {
        BUILTIN.as_ref().map_err(Clone::clone)
    }

    /// The configured pricing file, or the builtin table.
    pub fn from_config(config: &EvaluatorConfig) -> Result<Self, LlmError> {
        match &config.pricing_file {
            Some(path) => Self::from_path(path),
            None => Self::builtin().cloned(),
        }
    }

    pub fn table(&self) -> &PricingTable {
        &self.table
    }

    /// Estimate the cost of a batch of usage entries.
    pub fn estimate(&self, entries: &[TokenUsageEntry]) -> CostEstimate {
        let mut total = 0.0;
        let mut breakdown = Vec::new();

        for entry in entries {
            let Some(provider) = entry
                .provider
                .as_deref()
                .filter(|p| !p.is_empty() && *p != EXCLUDED_PROVIDER)
            else {
                continue;
            };
            let Some(total_tokens) = entry.total_tokens.filter(|t| *t > 0) else {
                continue;
            };
            let model = entry.model.as_deref().filter(|m| !m.is_empty());

            let Some(matched) = self.find_rate(provider, model) else {
                tracing::debug!(target: "redguard::pricing", provider, "no pricing for provider");
                breakdown.push(CostLine {
                    provider: provider.to_string(),
                    model: model.unwrap_or("unknown").to_string(),
                    matched_pricing: None,
                    total_tokens,
                    input_tokens: None,
                    output_tokens: None,
                    cost: None,
                    note: Some(UNKNOWN_PROVIDER_NOTE.to_string()),
                });
                continue;
            };

            let input = entry.input_tokens.filter(|n| *n > 0);
            let output = entry.output_tokens.filter(|n| *n > 0);
            let rate = matched.rate;
            let cost = match (input, output) {
                (Some(i), Some(o)) => {
                    i as f64 / TOKENS_PER_UNIT * rate.input_per_1m
                        + o as f64 / TOKENS_PER_UNIT * rate.output_per_1m
                }
                _ => total_tokens as f64 / TOKENS_PER_UNIT * self.blended(rate),
            };

            total += cost;
            breakdown.push(CostLine {
                provider: provider.to_string(),
                model: model.unwrap_or("unknown").to_string(),
                matched_pricing: Some(matched.label.into_owned()),
                total_tokens,
                input_tokens: input,
                output_tokens: output,
                cost: Some(round_to(cost, 6)),
                note: None,
            });
        }

        CostEstimate {
            total_estimate: round_to(total, 2),
            total_estimate_precise: round_to(total, 6),
            currency: self.table.currency.clone(),
            breakdown,
            pricing_date: self.table.last_updated.clone(),
            disclaimer: DISCLAIMER,
        }
    }

    pub fn pricing_info(&self) -> PricingInfo {
        PricingInfo {
            currency: self.table.currency.clone(),
            last_updated: self.table.last_updated.clone(),
            default_ratio: self.table.default_input_output_ratio,
            providers: self
                .table
                .providers
                .iter()
                .map(|(provider, rows)| ProviderPricing {
                    provider: provider.clone(),
                    models: rows
                        .iter()
                        .map(|row| ModelPrice {
                            label: row.model_label.clone(),
                            rate: row.rate,
                        })
                        .collect(),
                })
                .collect(),
            fallbacks: self.table.fallback_rates.clone(),
        }
    }

    fn find_rate<'a>(&'a self, provider: &str, model: Option<&str>) -> Option<MatchedRate<'a>> {
        let by_pattern = model.and_then(|model| {
            self.rules
                .get(provider)?
                .iter()
                .find(|rule| rule.regex.is_match(model))
        });
        if let Some(rule) = by_pattern {
            return Some(MatchedRate {
                label: rule.label.as_str().into(),
                rate: rule.rate,
            });
        }
        self.table
            .fallback_rates
            .get(provider)
            .map(|rate| MatchedRate {
                label: format!("{provider} (avg)").into(),
                rate: *rate,
            })
    }

    fn blended(&self, rate: Rate) -> f64 {
        let ratio = self.table.default_input_output_ratio;
        rate.input_per_1m * ratio.input + rate.output_per_1m * ratio.output
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
