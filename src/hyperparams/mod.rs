//! Hyperparameter configuration
//!
//! Maps a provider and model identifier to the knobs a user may tune for that
//! model family: bounds, defaults, and which knobs lock each other out.
//!
//! Every provider/model combination resolves to some configuration. Unknown
//! providers get a minimal temperature / max tokens / top_p schema.
//!
//! ```rust,ignore
//! use redguard::hyperparams::{resolve, defaults_of};
//! use redguard::types::ProviderId;
//!
//! let config = resolve(&ProviderId::Anthropic, Some("claude-opus-4-1"));
//! let defaults = defaults_of(config);
//! assert!(config.is_blocked("temperature", &defaults) == false);
//! ```

mod families;
pub mod rules;

pub use families::{ModelMatch, resolve};
pub use rules::{Condition, ExclusionRule, ParamCondition};

use serde::Serialize;

use crate::error::LlmError;
use crate::types::{ParamMap, ParamValue};

/// Value domain of a parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamKind {
    Number { min: f64, max: f64, step: f64 },
    Select { options: &'static [&'static str] },
}

/// One tunable knob
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: ParamKind,
    /// `None` means intentionally unset (e.g. a random seed)
    pub default_value: Option<ParamValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub help_text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_when: Option<ExclusionRule>,
}

impl ParameterDefinition {
    pub fn number(key: &'static str, label: &'static str, min: f64, max: f64, step: f64) -> Self {
        Self {
            key,
            label,
            kind: ParamKind::Number { min, max, step },
            default_value: None,
            placeholder: None,
            help_text: "",
            disabled_when: None,
        }
    }

    pub fn select(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            key,
            label,
            kind: ParamKind::Select { options },
            default_value: None,
            placeholder: None,
            help_text: "",
            disabled_when: None,
        }
    }

    pub fn default_value(mut self, value: impl Into<ParamValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn help(mut self, help_text: &'static str) -> Self {
        self.help_text = help_text;
        self
    }

    pub fn disabled_when(mut self, rule: ExclusionRule) -> Self {
        self.disabled_when = Some(rule);
        self
    }

    /// Upper numeric bound, if this is a numeric parameter.
    pub fn max(&self) -> Option<f64> {
        match self.kind {
            ParamKind::Number { max, .. } => Some(max),
            ParamKind::Select { .. } => None,
        }
    }

    /// Check a submitted value against the kind and bounds.
    pub fn check(&self, value: &ParamValue) -> Result<(), LlmError> {
        match (&self.kind, value) {
            (ParamKind::Number { min, max, .. }, ParamValue::Number(n)) => {
                if n.is_finite() && *n >= *min && *n <= *max {
                    Ok(())
                } else {
                    Err(LlmError::InvalidParameter(format!(
                        "{} must be between {min} and {max}, got {n}",
                        self.key
                    )))
                }
            }
            (ParamKind::Select { options }, ParamValue::Text(s)) => {
                if options.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(LlmError::InvalidParameter(format!(
                        "{} must be one of [{}], got {s}",
                        self.key,
                        options.join(", ")
                    )))
                }
            }
            (ParamKind::Number { .. }, ParamValue::Text(s)) => Err(LlmError::InvalidParameter(
                format!("{} expects a number, got \"{s}\"", self.key),
            )),
            (ParamKind::Select { .. }, ParamValue::Number(n)) => Err(LlmError::InvalidParameter(
                format!("{} expects one of its options, got {n}", self.key),
            )),
        }
    }
}

/// Parameter schema of one provider/model family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfiguration {
    /// Stable family name, e.g. `anthropic-opus`
    pub family: &'static str,
    pub params: Vec<ParameterDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_banner: Option<&'static str>,
    /// The banner shows when any of these holds
    #[serde(skip)]
    pub banner_when: Vec<ParamCondition>,
}

impl ModelConfiguration {
    pub fn param(&self, key: &str) -> Option<&ParameterDefinition> {
        self.params.iter().find(|p| p.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|p| p.key)
    }

    /// Defaults of every parameter that declares one.
    pub fn defaults(&self) -> ParamMap {
        self.params
            .iter()
            .filter_map(|p| {
                p.default_value
                    .as_ref()
                    .map(|v| (p.key.to_string(), v.clone()))
            })
            .collect()
    }

    /// Defaults overlaid by submitted values.
    pub fn effective_values(&self, submitted: &ParamMap) -> ParamMap {
        let mut values = self.defaults();
        values.extend(submitted.iter().map(|(k, v)| (k.clone(), v.clone())));
        values
    }

    /// The rule currently locking `key`, if any.
    pub fn blocking_rule(&self, key: &str, submitted: &ParamMap) -> Option<&ExclusionRule> {
        let rule = self.param(key)?.disabled_when.as_ref()?;
        let values = self.effective_values(submitted);
        rule.blocks(&values).then_some(rule)
    }

    pub fn is_blocked(&self, key: &str, submitted: &ParamMap) -> bool {
        self.blocking_rule(key, submitted).is_some()
    }

    /// Banner text to surface for the current values.
    pub fn banner(&self, submitted: &ParamMap) -> Option<&'static str> {
        let text = self.info_banner?;
        let values = self.effective_values(submitted);
        self.banner_when
            .iter()
            .any(|c| c.holds(&values))
            .then_some(text)
    }

    /// Reject submitted values that violate a parameter's kind or bounds.
    ///
    /// Keys that are not part of this schema are ignored. Conflicting
    /// exclusive parameters are not an error here; payload construction
    /// resolves them deterministically.
    pub fn validate(&self, submitted: &ParamMap) -> Result<(), LlmError> {
        for (key, value) in submitted {
            if let Some(def) = self.param(key) {
                def.check(value)?;
            }
        }
        Ok(())
    }
}

/// Default values of a configuration, omitting intentionally unset knobs.
pub fn defaults_of(config: &ModelConfiguration) -> ParamMap {
    config.defaults()
}
