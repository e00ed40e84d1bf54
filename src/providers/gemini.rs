//! Gemini generateContent dialect

use reqwest::header::{HeaderMap, HeaderName};
use secrecy::SecretString;
use serde_json::{Map, Value, json};

use super::utils::{
    ParsedReply, PathSeg, as_count, copy_param, generic_usage, parse_structured, read_params,
    require_text, secret_header, strip_code_fences,
};
use crate::error::LlmError;
use crate::types::{ParamMap, TokenUsage};

const JSON_SUFFIX: &str = "\n\nReturn JSON output.";

const TEXT_PATH: [PathSeg; 6] = [
    PathSeg::Key("candidates"),
    PathSeg::Index(0),
    PathSeg::Key("content"),
    PathSeg::Key("parts"),
    PathSeg::Index(0),
    PathSeg::Key("text"),
];

pub fn build_payload(prompt: &str, params: &ParamMap) -> Value {
    let mut config = Map::new();
    copy_param(params, "temperature", &mut config, "temperature");
    copy_param(params, "max_tokens", &mut config, "maxOutputTokens");
    copy_param(params, "top_p", &mut config, "topP");
    copy_param(params, "top_k", &mut config, "topK");
    copy_param(params, "presence_penalty", &mut config, "presencePenalty");
    copy_param(params, "frequency_penalty", &mut config, "frequencyPenalty");
    copy_param(params, "seed", &mut config, "seed");

    json!({
        "contents": [{ "parts": [{ "text": format!("{prompt}{JSON_SUFFIX}") }] }],
        "generationConfig": config,
    })
}

/// The model goes in the path; the key travels in a header so it never
/// shows up in URLs or logs.
pub fn endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        urlencoding::encode(model)
    )
}

pub fn headers(credential: &SecretString) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-goog-api-key"),
        secret_header("", credential)?,
    );
    Ok(headers)
}

pub fn parse_reply(body: &Value) -> Result<ParsedReply, LlmError> {
    let raw_text = require_text(body, &TEXT_PATH, "candidates[0].content.parts[0].text")?;
    let parsed = parse_structured(raw_text, &strip_code_fences(raw_text))?;
    Ok(ParsedReply {
        raw_text: raw_text.to_string(),
        parsed,
        usage: extract_usage(body),
    })
}

pub fn extract_usage(body: &Value) -> Option<TokenUsage> {
    let meta = body.get("usageMetadata");
    match as_count(meta.and_then(|m| m.get("totalTokenCount"))) {
        Some(total) => Some(TokenUsage {
            total_tokens: total,
            input_tokens: as_count(meta.and_then(|m| m.get("promptTokenCount"))),
            output_tokens: as_count(meta.and_then(|m| m.get("candidatesTokenCount"))),
        }),
        None => generic_usage(body),
    }
}

pub fn params_from_payload(payload: &Value) -> ParamMap {
    read_params(
        payload.get("generationConfig"),
        &[
            ("temperature", "temperature"),
            ("maxOutputTokens", "max_tokens"),
            ("topP", "top_p"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamValue;

    #[test]
    fn payload_renames_generation_config() {
        let mut p = ParamMap::new();
        p.insert("temperature".into(), ParamValue::Number(0.2));
        p.insert("max_tokens".into(), ParamValue::Number(1024.0));
        p.insert("top_k".into(), ParamValue::Number(40.0));
        let body = build_payload("rate this", &p);
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "rate this\n\nReturn JSON output."
        );
        let config = &body["generationConfig"];
        assert_eq!(config["temperature"], json!(0.2));
        assert_eq!(config["maxOutputTokens"], json!(1024));
        assert_eq!(config["topK"], json!(40));
        assert!(config.get("topP").is_none());
        assert!(config.get("seed").is_none());
    }

    #[test]
    fn endpoint_encodes_model_and_keeps_key_out() {
        let url = endpoint("https://generativelanguage.googleapis.com/v1beta", "gemini 2.5");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini%202.5:generateContent"
        );
        assert!(!url.contains("key="));
    }

    #[test]
    fn reply_usage_comes_from_metadata() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "```json\n{\"score\": 4}\n```"}]}}],
            "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10}
        });
        let reply = parse_reply(&body).unwrap();
        assert_eq!(reply.parsed["score"], 4);
        assert_eq!(reply.usage, Some(TokenUsage::split(7, 3)));
    }

    #[test]
    fn params_are_read_back_from_generation_config() {
        let payload = json!({"generationConfig": {"temperature": 0.9, "maxOutputTokens": 256}});
        let p = params_from_payload(&payload);
        assert_eq!(p["temperature"], ParamValue::Number(0.9));
        assert_eq!(p["max_tokens"], ParamValue::Number(256.0));
        assert!(!p.contains_key("top_p"));
    }
}
