//! Model family tables and provider routing
//!
//! Each family's schema is built once on first use and shared for the life of
//! the process. Routing tests the model string against an ordered list per
//! provider; the first match wins.

use std::sync::LazyLock;

use super::rules::{ExclusionRule, ParamCondition};
use super::{ModelConfiguration, ParameterDefinition};
use crate::types::ProviderId;

/// Model identifier predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelMatch {
    Contains(&'static str),
    StartsWith(&'static str),
}

impl ModelMatch {
    pub fn matches(&self, model: &str) -> bool {
        match self {
            Self::Contains(needle) => model.contains(needle),
            Self::StartsWith(prefix) => model.starts_with(prefix),
        }
    }
}

struct Route {
    /// Any of these selects the family
    any_of: &'static [ModelMatch],
    config: &'static LazyLock<ModelConfiguration>,
}

struct ProviderRoutes {
    routes: &'static [Route],
    fallback: &'static LazyLock<ModelConfiguration>,
}

static ANTHROPIC_ROUTES: ProviderRoutes = ProviderRoutes {
    routes: &[Route {
        any_of: &[ModelMatch::Contains("opus")],
        config: &ANTHROPIC_OPUS,
    }],
    fallback: &ANTHROPIC,
};

// o3/o4 are checked before gpt-5 and gpt-4.1.
// TODO: unknown OpenAI models land on the GPT-4.1 bounds; revisit once newer families ship.
static OPENAI_ROUTES: ProviderRoutes = ProviderRoutes {
    routes: &[
        Route {
            any_of: &[ModelMatch::StartsWith("o3"), ModelMatch::StartsWith("o4")],
            config: &OPENAI_O_SERIES,
        },
        Route {
            any_of: &[ModelMatch::StartsWith("gpt-5")],
            config: &OPENAI_GPT5,
        },
        Route {
            any_of: &[ModelMatch::StartsWith("gpt-4.1")],
            config: &OPENAI_GPT41,
        },
    ],
    fallback: &OPENAI_GPT41,
};

static GEMINI_ROUTES: ProviderRoutes = ProviderRoutes {
    routes: &[
        Route {
            any_of: &[ModelMatch::Contains("3-pro")],
            config: &GEMINI_3_PRO,
        },
        Route {
            any_of: &[ModelMatch::Contains("2.5-flash")],
            config: &GEMINI_25_FLASH,
        },
    ],
    fallback: &GEMINI_BASE,
};

static OPENAI_COMPATIBLE_ROUTES: ProviderRoutes = ProviderRoutes {
    routes: &[],
    fallback: &OPENAI_COMPATIBLE,
};

static UNIVERSAL_ROUTES: ProviderRoutes = ProviderRoutes {
    routes: &[],
    fallback: &UNIVERSAL,
};

/// Resolve the parameter schema for a provider and model.
///
/// Never fails: unmatched models get the provider's fallback family and
/// unknown providers get the universal three-parameter schema.
pub fn resolve(provider: &ProviderId, model: Option<&str>) -> &'static ModelConfiguration {
    let table = match provider {
        ProviderId::Anthropic => &ANTHROPIC_ROUTES,
        ProviderId::OpenAi => &OPENAI_ROUTES,
        ProviderId::Gemini => &GEMINI_ROUTES,
        ProviderId::DeepSeek | ProviderId::Qwen | ProviderId::Kimi => &OPENAI_COMPATIBLE_ROUTES,
        ProviderId::Other(_) => &UNIVERSAL_ROUTES,
    };

    let model = model.unwrap_or_default();
    let selected = if model.is_empty() {
        table.fallback
    } else {
        table
            .routes
            .iter()
            .find(|r| r.any_of.iter().any(|m| m.matches(model)))
            .map_or(table.fallback, |r| r.config)
    };

    let config = LazyLock::force(selected);
    tracing::trace!(target: "redguard::hyperparams", provider=%provider, model, family=config.family, "resolved model configuration");
    config
}

// --- shared knobs ---

fn temperature(max: f64, default: f64, help: &'static str) -> ParameterDefinition {
    ParameterDefinition::number("temperature", "Temperature", 0.0, max, 0.1)
        .default_value(default)
        .help(help)
}

fn max_tokens(max: f64, default: f64, help: &'static str) -> ParameterDefinition {
    ParameterDefinition::number("max_tokens", "Max Tokens", 100.0, max, 100.0)
        .default_value(default)
        .help(help)
}

fn top_p() -> ParameterDefinition {
    ParameterDefinition::number("top_p", "Top P", 0.0, 1.0, 0.05)
        .default_value(1.0)
        .help("Nucleus sampling")
}

fn top_k() -> ParameterDefinition {
    ParameterDefinition::number("top_k", "Top K", 0.0, 500.0, 1.0)
        .placeholder("Off")
        .help("Limits token pool")
}

fn seed() -> ParameterDefinition {
    ParameterDefinition::number("seed", "Seed", 0.0, 2_147_483_647.0, 1.0)
        .placeholder("Random")
        .help("For reproducibility")
}

fn frequency_penalty() -> ParameterDefinition {
    ParameterDefinition::number("frequency_penalty", "Frequency Penalty", -2.0, 2.0, 0.1)
        .default_value(0.0)
        .help("Penalizes repeated tokens")
}

fn presence_penalty() -> ParameterDefinition {
    ParameterDefinition::number("presence_penalty", "Presence Penalty", -2.0, 2.0, 0.1)
        .default_value(0.0)
        .help("Encourages new topics")
}

fn reasoning_effort(options: &'static [&'static str]) -> ParameterDefinition {
    ParameterDefinition::select("reasoning_effort", "Reasoning Effort", options)
        .default_value("medium")
        .help("Controls reasoning depth")
}

fn locked_while_reasoning(def: ParameterDefinition) -> ParameterDefinition {
    def.disabled_when(ExclusionRule::new(
        ParamCondition::not_equals("reasoning_effort", "none"),
        "Set Effort to None",
    ))
}

// --- families ---

static ANTHROPIC: LazyLock<ModelConfiguration> = LazyLock::new(|| anthropic(64_000.0, "Max 64,000"));

static ANTHROPIC_OPUS: LazyLock<ModelConfiguration> = LazyLock::new(|| ModelConfiguration {
    family: "anthropic-opus",
    ..anthropic(128_000.0, "Max 128,000")
});

fn anthropic(max_tokens_cap: f64, max_tokens_help: &'static str) -> ModelConfiguration {
    ModelConfiguration {
        family: "anthropic",
        params: vec![
            temperature(1.0, 0.0, "0 = deterministic, max 1.0").disabled_when(ExclusionRule::new(
                ParamCondition::not_equals("top_p", 1.0),
                "Clear Top P to edit",
            )),
            max_tokens(max_tokens_cap, 4096.0, max_tokens_help),
            top_p().disabled_when(ExclusionRule::new(
                ParamCondition::not_equals("temperature", 0.0),
                "Clear Temperature to edit",
            )),
            top_k(),
        ],
        info_banner: Some(
            "Anthropic models: Temperature and Top P are mutually exclusive. Clear one to use the other.",
        ),
        banner_when: vec![
            ParamCondition::not_equals("temperature", 0.0),
            ParamCondition::not_equals("top_p", 1.0),
        ],
    }
}

static OPENAI_GPT5: LazyLock<ModelConfiguration> = LazyLock::new(|| ModelConfiguration {
    family: "openai-gpt5",
    params: vec![
        reasoning_effort(&["none", "low", "medium", "high"]),
        max_tokens(128_000.0, 2000.0, "Max 128,000"),
        seed(),
        locked_while_reasoning(temperature(2.0, 0.0, "0 = deterministic")),
        locked_while_reasoning(top_p()),
    ],
    info_banner: Some(
        "Temperature and Top P are only available when Reasoning Effort is set to None.",
    ),
    banner_when: vec![ParamCondition::not_equals("reasoning_effort", "none")],
});

static OPENAI_O_SERIES: LazyLock<ModelConfiguration> = LazyLock::new(|| ModelConfiguration {
    family: "openai-o-series",
    params: vec![
        reasoning_effort(&["low", "medium", "high"]),
        max_tokens(128_000.0, 2000.0, "Max 128,000"),
        seed(),
    ],
    info_banner: None,
    banner_when: Vec::new(),
});

static OPENAI_GPT41: LazyLock<ModelConfiguration> = LazyLock::new(|| ModelConfiguration {
    family: "openai-gpt41",
    params: vec![
        temperature(2.0, 0.7, "0 = deterministic"),
        max_tokens(32_768.0, 4096.0, "Max 32,768"),
        top_p(),
        frequency_penalty(),
        presence_penalty(),
        seed(),
    ],
    info_banner: None,
    banner_when: Vec::new(),
});

fn gemini_base_params() -> Vec<ParameterDefinition> {
    vec![
        temperature(2.0, 0.0, "0 = deterministic"),
        max_tokens(65_536.0, 4096.0, "Max 65,536"),
        top_p(),
        top_k(),
    ]
}

static GEMINI_BASE: LazyLock<ModelConfiguration> = LazyLock::new(|| ModelConfiguration {
    family: "gemini",
    params: gemini_base_params(),
    info_banner: None,
    banner_when: Vec::new(),
});

static GEMINI_25_FLASH: LazyLock<ModelConfiguration> = LazyLock::new(|| {
    let mut params = gemini_base_params();
    params.push(presence_penalty());
    ModelConfiguration {
        family: "gemini-2.5-flash",
        params,
        info_banner: None,
        banner_when: Vec::new(),
    }
});

static GEMINI_3_PRO: LazyLock<ModelConfiguration> = LazyLock::new(|| {
    let mut params = gemini_base_params();
    params.push(presence_penalty());
    params.push(frequency_penalty());
    ModelConfiguration {
        family: "gemini-3-pro",
        params,
        info_banner: None,
        banner_when: Vec::new(),
    }
});

static OPENAI_COMPATIBLE: LazyLock<ModelConfiguration> = LazyLock::new(|| ModelConfiguration {
    family: "openai-compatible",
    params: vec![
        temperature(2.0, 0.0, "0 = deterministic"),
        max_tokens(32_768.0, 4096.0, "Max 32,768"),
        top_p(),
        frequency_penalty(),
        presence_penalty(),
        seed(),
    ],
    info_banner: None,
    banner_when: Vec::new(),
});

static UNIVERSAL: LazyLock<ModelConfiguration> = LazyLock::new(|| ModelConfiguration {
    family: "universal",
    params: vec![
        temperature(2.0, 0.0, "0 = deterministic"),
        max_tokens(8192.0, 4096.0, "Max 8,192"),
        top_p(),
    ],
    info_banner: None,
    banner_when: Vec::new(),
});

#[cfg(test)]
mod tests {
    use super::*;

    static ALL_FAMILIES: [&LazyLock<ModelConfiguration>; 10] = [
        &ANTHROPIC,
        &ANTHROPIC_OPUS,
        &OPENAI_GPT5,
        &OPENAI_O_SERIES,
        &OPENAI_GPT41,
        &GEMINI_BASE,
        &GEMINI_25_FLASH,
        &GEMINI_3_PRO,
        &OPENAI_COMPATIBLE,
        &UNIVERSAL,
    ];

    #[test]
    fn exclusion_rules_reference_keys_of_the_same_schema() {
        for family in ALL_FAMILIES {
            let config = LazyLock::force(family);
            for def in &config.params {
                if let Some(rule) = &def.disabled_when {
                    assert!(
                        config.param(rule.when.param).is_some(),
                        "{}: {} references missing {}",
                        config.family,
                        def.key,
                        rule.when.param
                    );
                    assert_ne!(rule.when.param, def.key);
                }
            }
        }
    }

    #[test]
    fn keys_are_unique_and_defaults_within_bounds() {
        for family in ALL_FAMILIES {
            let config = LazyLock::force(family);
            let mut keys: Vec<_> = config.keys().collect();
            let count = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), count, "{}", config.family);
            for def in &config.params {
                if let Some(default) = &def.default_value {
                    def.check(default).unwrap();
                }
            }
        }
    }

    #[test]
    fn o_series_is_checked_before_other_openai_prefixes() {
        assert_eq!(resolve(&ProviderId::OpenAi, Some("o4-mini")).family, "openai-o-series");
        assert_eq!(resolve(&ProviderId::OpenAi, Some("gpt-4.1-nano")).family, "openai-gpt41");
        assert_eq!(resolve(&ProviderId::OpenAi, Some("gpt-4o")).family, "openai-gpt41");
        assert_eq!(resolve(&ProviderId::OpenAi, None).family, "openai-gpt41");
    }

    #[test]
    fn gemini_three_pro_wins_over_flash_when_both_match() {
        let config = resolve(&ProviderId::Gemini, Some("gemini-3-pro-2.5-flash-hybrid"));
        assert_eq!(config.family, "gemini-3-pro");
    }

    #[test]
    fn model_match_predicates() {
        assert!(ModelMatch::StartsWith("o3").matches("o3-mini"));
        assert!(!ModelMatch::StartsWith("o3").matches("gpt-o3"));
        assert!(ModelMatch::Contains("opus").matches("claude-3-opus-20240229"));
    }
}
