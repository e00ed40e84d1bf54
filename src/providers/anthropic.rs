//! Anthropic Messages dialect
//!
//! Anthropic rejects requests that set both `temperature` and `top_p` on
//! several models, so only one of them is ever sent: `top_p` when it differs
//! from 1.0, `temperature` otherwise.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::SecretString;
use serde_json::{Map, Value, json};

use super::utils::{
    ParsedReply, PathSeg, as_count, copy_param, generic_usage, parse_structured, read_params,
    require_text, secret_header, strip_code_fences,
};
use crate::error::LlmError;
use crate::types::{ParamMap, TokenUsage};

pub const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: i64 = 4096;
const NEUTRAL_TOP_P: f64 = 1.0;

const TEXT_PATH: [PathSeg; 3] = [PathSeg::Key("content"), PathSeg::Index(0), PathSeg::Key("text")];

pub fn build_payload(model: &str, prompt: &str, params: &ParamMap) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(model));
    body.insert(
        "max_tokens".into(),
        params
            .get("max_tokens")
            .map_or(json!(DEFAULT_MAX_TOKENS), |v| v.to_json()),
    );
    body.insert(
        "messages".into(),
        json!([{ "role": "user", "content": prompt }]),
    );

    match params.get("top_p").and_then(|v| v.as_f64()) {
        Some(top_p) if top_p != NEUTRAL_TOP_P => {
            copy_param(params, "top_p", &mut body, "top_p");
        }
        _ => {
            let temperature = params
                .get("temperature")
                .map_or(json!(0.0), |v| v.to_json());
            body.insert("temperature".into(), temperature);
        }
    }
    copy_param(params, "top_k", &mut body, "top_k");

    Value::Object(body)
}

pub fn endpoint(base_url: &str) -> String {
    format!("{}/messages", base_url.trim_end_matches('/'))
}

pub fn headers(credential: &SecretString) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-api-key"),
        secret_header("", credential)?,
    );
    headers.insert(
        HeaderName::from_static("anthropic-version"),
        HeaderValue::from_static(API_VERSION),
    );
    Ok(headers)
}

pub fn parse_reply(body: &Value) -> Result<ParsedReply, LlmError> {
    let raw_text = require_text(body, &TEXT_PATH, "content[0].text")?;
    let parsed = parse_structured(raw_text, &strip_code_fences(raw_text))?;
    Ok(ParsedReply {
        raw_text: raw_text.to_string(),
        parsed,
        usage: extract_usage(body),
    })
}

/// `input_tokens + output_tokens`; `None` when the reply has no usage block.
pub fn extract_usage(body: &Value) -> Option<TokenUsage> {
    let usage = body.get("usage").filter(|u| u.is_object());
    let input = as_count(usage.and_then(|u| u.get("input_tokens")));
    let output = as_count(usage.and_then(|u| u.get("output_tokens")));
    match (input, output) {
        (Some(i), Some(o)) => Some(TokenUsage::split(i, o)),
        (Some(n), None) | (None, Some(n)) => Some(TokenUsage {
            total_tokens: n,
            input_tokens: input,
            output_tokens: output,
        }),
        (None, None) => generic_usage(body),
    }
}

pub fn params_from_payload(payload: &Value) -> ParamMap {
    read_params(
        Some(payload),
        &[
            ("temperature", "temperature"),
            ("max_tokens", "max_tokens"),
            ("top_p", "top_p"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamValue;

    fn params(pairs: &[(&str, ParamValue)]) -> ParamMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn non_neutral_top_p_wins_over_temperature() {
        let p = params(&[("temperature", 0.8.into()), ("top_p", 0.9.into())]);
        let body = build_payload("claude-opus-4-1", "p", &p);
        assert_eq!(body["top_p"], json!(0.9));
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn neutral_top_p_sends_temperature_only() {
        let p = params(&[("temperature", 0.5.into()), ("top_p", 1.0.into())]);
        let body = build_payload("claude-sonnet-4-5", "p", &p);
        assert_eq!(body["temperature"], json!(0.5));
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn unset_temperature_defaults_to_zero() {
        let body = build_payload("claude-haiku-4-5", "p", &ParamMap::new());
        assert_eq!(body["temperature"], json!(0.0));
        assert_eq!(body["max_tokens"], json!(4096));
        assert_eq!(body["messages"][0]["content"], "p");
        assert!(body.get("top_k").is_none());
    }

    #[test]
    fn top_k_is_forwarded_when_set() {
        let p = params(&[("top_k", 40_i64.into())]);
        assert_eq!(build_payload("m", "p", &p)["top_k"], json!(40));
    }

    #[test]
    fn fenced_reply_is_parsed() {
        let body = json!({
            "content": [{"type": "text", "text": "```json\n{\"verdict\": \"pass\"}\n```"}],
            "usage": {"input_tokens": 100, "output_tokens": 20}
        });
        let reply = parse_reply(&body).unwrap();
        assert_eq!(reply.parsed["verdict"], "pass");
        assert!(reply.raw_text.starts_with("```json"));
        assert_eq!(reply.usage, Some(TokenUsage::split(100, 20)));
    }

    #[test]
    fn missing_usage_is_absent_not_zero() {
        let body = json!({"content": [{"type": "text", "text": "{}"}]});
        assert_eq!(parse_reply(&body).unwrap().usage, None);
    }

    #[test]
    fn oversized_counts_do_not_overflow() {
        let body = json!({
            "content": [{"type": "text", "text": "{}"}],
            "usage": {"input_tokens": u64::MAX, "output_tokens": 1}
        });
        let usage = parse_reply(&body).unwrap().usage.unwrap();
        assert_eq!(usage.total_tokens, u64::MAX);
        assert_eq!(usage.input_tokens, Some(u64::MAX));
    }

    #[test]
    fn headers_carry_key_and_version() {
        let h = headers(&SecretString::from("sk-ant")).unwrap();
        assert_eq!(h["x-api-key"], "sk-ant");
        assert!(h["x-api-key"].is_sensitive());
        assert_eq!(h["anthropic-version"], API_VERSION);
    }
}
