//! Cost estimation over custom and builtin price tables.

use std::io::Write;

use redguard::config::EvaluatorConfig;
use redguard::error::LlmError;
use redguard::pricing::{DISCLAIMER, PricingEstimator, UNKNOWN_PROVIDER_NOTE};
use redguard::types::TokenUsageEntry;

const TABLE: &str = r#"{
    "currency": "USD",
    "lastUpdated": "2025-06-01",
    "defaultInputOutputRatio": {"input": 0.25, "output": 0.75},
    "providers": {
        "openai": [
            {"modelPattern": "^gpt-4o-mini", "modelLabel": "GPT-4o mini", "inputPer1M": 0.15, "outputPer1M": 0.6},
            {"modelPattern": "^gpt-4o", "modelLabel": "GPT-4o", "inputPer1M": 5, "outputPer1M": 15}
        ],
        "anthropic": [
            {"modelPattern": "sonnet", "modelLabel": "Claude Sonnet", "inputPer1M": 3, "outputPer1M": 15}
        ]
    },
    "fallbackRates": {
        "openai": {"inputPer1M": 2.5, "outputPer1M": 10},
        "gemini": {"inputPer1M": 1.25, "outputPer1M": 10}
    }
}"#;

fn estimator() -> PricingEstimator {
    PricingEstimator::from_json_str(TABLE).expect("table")
}

#[test]
fn blended_rate_for_total_only_entries() {
    let estimate = estimator().estimate(&[TokenUsageEntry::new("openai", "gpt-4o", 2_000_000)]);

    assert_eq!(estimate.total_estimate, 25.0);
    assert_eq!(estimate.total_estimate_precise, 25.0);
    assert_eq!(estimate.currency, "USD");
    assert_eq!(estimate.pricing_date, "2025-06-01");
    assert_eq!(estimate.disclaimer, DISCLAIMER);

    let line = &estimate.breakdown[0];
    assert_eq!(line.matched_pricing.as_deref(), Some("GPT-4o"));
    assert_eq!(line.cost, Some(25.0));
    assert_eq!(line.input_tokens, None);
}

#[test]
fn precise_split_when_both_counts_positive() {
    let split = TokenUsageEntry::new("openai", "gpt-4o", 2_000_000).with_split(1_000_000, 1_000_000);
    let estimate = estimator().estimate(&[split]);
    // 1M * $5 + 1M * $15
    assert_eq!(estimate.total_estimate, 20.0);

    let one_sided = TokenUsageEntry::new("openai", "gpt-4o", 2_000_000).with_split(2_000_000, 0);
    let estimate = estimator().estimate(&[one_sided]);
    assert_eq!(estimate.total_estimate, 25.0);
    assert_eq!(estimate.breakdown[0].output_tokens, None);
}

#[test]
fn first_matching_pattern_wins_case_insensitively() {
    let estimate = estimator().estimate(&[TokenUsageEntry::new("openai", "GPT-4o-Mini-2024", 1000)]);
    assert_eq!(
        estimate.breakdown[0].matched_pricing.as_deref(),
        Some("GPT-4o mini")
    );
}

#[test]
fn provider_fallback_is_labelled_avg() {
    let estimate = estimator().estimate(&[
        TokenUsageEntry::new("openai", "gpt-9-turbo", 1_000_000),
        TokenUsageEntry {
            provider: Some("gemini".into()),
            total_tokens: Some(1_000_000),
            ..Default::default()
        },
    ]);

    assert_eq!(estimate.breakdown[0].matched_pricing.as_deref(), Some("openai (avg)"));
    // 2.5 * 0.25 + 10 * 0.75
    assert_eq!(estimate.breakdown[0].cost, Some(8.125));
    assert_eq!(estimate.breakdown[1].matched_pricing.as_deref(), Some("gemini (avg)"));
    assert_eq!(estimate.breakdown[1].model, "unknown");
    // 8.125 + (1.25 * 0.25 + 10 * 0.75)
    assert_eq!(estimate.total_estimate_precise, 15.9375);
    assert_eq!(estimate.total_estimate, 15.94);
}

#[test]
fn unknown_provider_is_listed_without_cost() {
    let estimate = estimator().estimate(&[
        TokenUsageEntry::new("mistral", "mistral-large", 5000),
        TokenUsageEntry::new("anthropic", "claude-sonnet-4-5", 1_000_000),
    ]);

    let unknown = &estimate.breakdown[0];
    assert_eq!(unknown.cost, None);
    assert_eq!(unknown.note.as_deref(), Some(UNKNOWN_PROVIDER_NOTE));
    assert_eq!(unknown.matched_pricing, None);
    assert_eq!(estimate.total_estimate, 12.0);

    let json = serde_json::to_value(&estimate).unwrap();
    assert!(json["breakdown"][0]["cost"].is_null());
    assert!(json["breakdown"][1].get("note").is_none());
    assert_eq!(json["totalEstimate"], 12.0);
}

#[test]
fn excluded_and_empty_entries_are_skipped() {
    let estimate = estimator().estimate(&[
        TokenUsageEntry::new("kore", "kore-guard", 10_000),
        TokenUsageEntry::new("openai", "gpt-4o", 0),
        TokenUsageEntry::new("openai", "gpt-4o", -5),
        TokenUsageEntry {
            model: Some("gpt-4o".into()),
            total_tokens: Some(100),
            ..Default::default()
        },
        TokenUsageEntry {
            provider: Some("openai".into()),
            model: Some("gpt-4o".into()),
            ..Default::default()
        },
    ]);

    assert!(estimate.breakdown.is_empty());
    assert_eq!(estimate.total_estimate, 0.0);
}

#[test]
fn empty_input_gives_zero_total() {
    let estimate = estimator().estimate(&[]);
    assert_eq!(estimate.total_estimate, 0.0);
    assert_eq!(estimate.total_estimate_precise, 0.0);
    assert!(estimate.breakdown.is_empty());
    assert_eq!(estimate.disclaimer, DISCLAIMER);
}

#[test]
fn small_costs_keep_six_decimals() {
    let estimate = estimator().estimate(&[TokenUsageEntry::new("openai", "gpt-4o-mini", 1234)]);
    // 1234 / 1M * (0.15 * 0.25 + 0.6 * 0.75)
    assert_eq!(estimate.breakdown[0].cost, Some(0.000602));
    assert_eq!(estimate.total_estimate, 0.0);
    assert_eq!(estimate.total_estimate_precise, 0.000602);
}

#[test]
fn pricing_info_lists_table_contents() {
    let info = estimator().pricing_info();
    assert_eq!(info.currency, "USD");
    assert_eq!(info.last_updated, "2025-06-01");
    assert_eq!(info.default_ratio.output, 0.75);
    let openai = info.providers.iter().find(|p| p.provider == "openai").unwrap();
    assert_eq!(openai.models.len(), 2);
    assert_eq!(openai.models[1].label, "GPT-4o");
    assert!(info.fallbacks.contains_key("gemini"));

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["defaultRatio"]["input"], 0.25);
    // table order, not alphabetical
    assert_eq!(json["providers"][0]["provider"], "openai");
    assert_eq!(json["providers"][1]["provider"], "anthropic");
    assert_eq!(json["providers"][0]["models"][0]["inputPer1M"], 0.15);
}

#[test]
fn invalid_pattern_fails_to_load() {
    let broken = TABLE.replace("^gpt-4o-mini", "^gpt-4o-(mini");
    let err = PricingEstimator::from_json_str(&broken).unwrap_err();
    assert!(matches!(err, LlmError::Configuration(msg) if msg.contains("pattern")));
}

#[test]
fn table_loads_from_configured_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TABLE.as_bytes()).unwrap();

    let config = EvaluatorConfig::builder()
        .pricing_file(file.path())
        .build()
        .unwrap();
    let estimator = PricingEstimator::from_config(&config).unwrap();
    assert_eq!(estimator.table().last_updated, "2025-06-01");

    let missing = PricingEstimator::from_path(file.path().with_extension("missing"));
    assert!(matches!(missing, Err(LlmError::Configuration(_))));
}

#[test]
fn builtin_table_prices_every_known_provider() {
    let estimator = PricingEstimator::from_config(&EvaluatorConfig::default()).unwrap();
    for (provider, model) in [
        ("openai", "gpt-4o"),
        ("anthropic", "claude-sonnet-4-5-20250929"),
        ("gemini", "gemini-2.5-pro-preview-06-05"),
        ("deepseek", "deepseek-chat"),
        ("qwen", "qwen-plus"),
        ("kimi", "moonshot-v1-8k"),
    ] {
        let estimate = estimator.estimate(&[TokenUsageEntry::new(provider, model, 10_000)]);
        let line = &estimate.breakdown[0];
        assert!(line.cost.unwrap() > 0.0, "{provider}/{model}");
        assert!(!line.matched_pricing.as_deref().unwrap().ends_with("(avg)"), "{provider}/{model}");
    }
}
