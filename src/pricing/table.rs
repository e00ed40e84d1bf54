//! Pricing table schema and compiled match rules

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LlmError;

/// Price per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(rename = "inputPer1M")]
    pub input_per_1m: f64,
    #[serde(rename = "outputPer1M")]
    pub output_per_1m: f64,
}

/// Share of a token total assumed to be input vs output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IoRatio {
    pub input: f64,
    pub output: f64,
}

/// One pattern row of a provider's price list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRate {
    pub model_pattern: String,
    pub model_label: String,
    #[serde(flatten)]
    pub rate: Rate,
}

/// Reference pricing data as stored on disk.
///
/// Rows of a provider are matched in order; the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTable {
    pub currency: String,
    pub last_updated: String,
    pub default_input_output_ratio: IoRatio,
    pub providers: ProviderRates,
    #[serde(default)]
    pub fallback_rates: BTreeMap<String, Rate>,
}

impl PricingTable {
    pub fn from_json_str(json: &str) -> Result<Self, LlmError> {
        serde_json::from_str(json)
            .map_err(|e| LlmError::Configuration(format!("invalid pricing table: {e}")))
    }

    /// Reject negative or non-finite numbers.
    pub fn check(&self) -> Result<(), LlmError> {
        let ratio = self.default_input_output_ratio;
        if !(non_negative(ratio.input) && non_negative(ratio.output)) {
            return Err(LlmError::Configuration(
                "defaultInputOutputRatio must be non-negative".to_string(),
            ));
        }
        let rows = self
            .providers
            .iter()
            .flat_map(|(p, rows)| rows.iter().map(move |r| (p, r.model_label.as_str(), r.rate)));
        let fallbacks = self
            .fallback_rates
            .iter()
            .map(|(p, rate)| (p, "fallback", *rate));
        for (provider, label, rate) in rows.chain(fallbacks) {
            if !(non_negative(rate.input_per_1m) && non_negative(rate.output_per_1m)) {
                return Err(LlmError::Configuration(format!(
                    "negative or non-finite rate for {provider} / {label}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-provider price lists, in the order the table lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderRates(Vec<(String, Vec<ModelRate>)>);

impl ProviderRates {
    pub fn get(&self, provider: &str) -> Option<&[ModelRate]> {
        self.0
            .iter()
            .find(|(name, _)| name == provider)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn get_mut(&mut self, provider: &str) -> Option<&mut Vec<ModelRate>> {
        self.0
            .iter_mut()
            .find(|(name, _)| name == provider)
            .map(|(_, rows)| rows)
    }

    /// Set a provider's rows; a new provider goes last.
    pub fn insert(&mut self, provider: impl Into<String>, rows: Vec<ModelRate>) {
        let provider = provider.into();
        match self.get_mut(&provider) {
            Some(existing) => *existing = rows,
            None => self.0.push((provider, rows)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &[ModelRate])> {
        self.0.iter().map(|(name, rows)| (name, rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ProviderRates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (provider, rows) in &self.0 {
            map.serialize_entry(provider, rows)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProviderRates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RatesVisitor;

        impl<'de> Visitor<'de> for RatesVisitor {
            type Value = ProviderRates;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of provider name to price rows")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut rates = ProviderRates::default();
                while let Some((provider, rows)) = access.next_entry::<String, Vec<ModelRate>>()? {
                    rates.insert(provider, rows);
                }
                Ok(rates)
            }
        }

        deserializer.deserialize_map(RatesVisitor)
    }
}

fn non_negative(n: f64) -> bool {
    n.is_finite() && n >= 0.0
}

/// A price-list row with its pattern compiled
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub regex: Regex,
    pub label: String,
    pub rate: Rate,
}

/// Compile every provider's rows, case-insensitively, keeping order.
pub(crate) fn compile(table: &PricingTable) -> Result<BTreeMap<String, Vec<CompiledRule>>, LlmError> {
    table
        .providers
        .iter()
        .map(|(provider, rows)| -> Result<(String, Vec<CompiledRule>), LlmError> {
            let rules = rows
                .iter()
                .map(|row| -> Result<CompiledRule, LlmError> {
                    let regex = RegexBuilder::new(&row.model_pattern)
                        .case_insensitive(true)
                        .build()?;
                    Ok(CompiledRule {
                        regex,
                        label: row.model_label.clone(),
                        rate: row.rate,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((provider.clone(), rules))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "currency": "USD",
        "lastUpdated": "2025-01-01",
        "defaultInputOutputRatio": {"input": 0.25, "output": 0.75},
        "providers": {
            "openai": [{"modelPattern": "^GPT-4o", "modelLabel": "GPT-4o", "inputPer1M": 2.5, "outputPer1M": 10}]
        }
    }"#;

    #[test]
    fn parses_wire_names() {
        let table = PricingTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.providers.get("openai").unwrap()[0].rate.output_per_1m, 10.0);
        assert!(table.fallback_rates.is_empty());
        assert!(table.check().is_ok());
    }

    #[test]
    fn providers_keep_table_order() {
        let json = r#"{
            "currency": "USD",
            "lastUpdated": "2025-01-01",
            "defaultInputOutputRatio": {"input": 0.25, "output": 0.75},
            "providers": {"openai": [], "anthropic": [], "gemini": []}
        }"#;
        let table = PricingTable::from_json_str(json).unwrap();
        let names: Vec<_> = table.providers.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["openai", "anthropic", "gemini"]);

        let back = serde_json::to_string(&table.providers).unwrap();
        assert_eq!(back, r#"{"openai":[],"anthropic":[],"gemini":[]}"#);
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let table = PricingTable::from_json_str(TABLE).unwrap();
        let rules = compile(&table).unwrap();
        assert!(rules["openai"][0].regex.is_match("gpt-4o-2024-08-06"));
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let mut table = PricingTable::from_json_str(TABLE).unwrap();
        table.providers.get_mut("openai").unwrap()[0].model_pattern = "gpt-(".into();
        assert!(matches!(compile(&table), Err(LlmError::Configuration(_))));
    }

    #[test]
    fn negative_rates_are_rejected() {
        let mut table = PricingTable::from_json_str(TABLE).unwrap();
        table.fallback_rates.insert(
            "openai".into(),
            Rate {
                input_per_1m: -1.0,
                output_per_1m: 1.0,
            },
        );
        assert!(table.check().is_err());
    }
}
