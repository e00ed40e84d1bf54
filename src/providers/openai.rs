//! OpenAI Chat Completions dialect
//!
//! Also spoken by the OpenAI-compatible endpoints (DeepSeek, Qwen, Kimi).

use reqwest::header::{AUTHORIZATION, HeaderMap};
use secrecy::SecretString;
use serde_json::{Map, Value, json};

use super::utils::{
    ParsedReply, PathSeg, as_count, copy_param, generic_usage, parse_structured, read_params,
    require_text, secret_header,
};
use crate::error::LlmError;
use crate::types::{ParamMap, TokenUsage};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that outputs JSON.";

const CONTENT_PATH: [PathSeg; 4] = [
    PathSeg::Key("choices"),
    PathSeg::Index(0),
    PathSeg::Key("message"),
    PathSeg::Key("content"),
];

pub fn build_payload(model: &str, prompt: &str, params: &ParamMap) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(model));
    body.insert(
        "messages".into(),
        json!([
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": prompt }
        ]),
    );

    // Reasoning models reject sampling controls and take max_completion_tokens.
    let effort = params
        .get("reasoning_effort")
        .and_then(|v| v.as_str())
        .filter(|e| *e != "none");
    match effort {
        Some(effort) => {
            body.insert("reasoning_effort".into(), json!(effort));
            copy_param(params, "max_tokens", &mut body, "max_completion_tokens");
        }
        None => {
            copy_param(params, "temperature", &mut body, "temperature");
            copy_param(params, "max_tokens", &mut body, "max_tokens");
            copy_param(params, "top_p", &mut body, "top_p");
        }
    }
    copy_param(params, "frequency_penalty", &mut body, "frequency_penalty");
    copy_param(params, "presence_penalty", &mut body, "presence_penalty");
    copy_param(params, "seed", &mut body, "seed");
    body.insert("response_format".into(), json!({ "type": "json_object" }));

    Value::Object(body)
}

pub fn endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

pub fn headers(credential: &SecretString) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, secret_header("Bearer ", credential)?);
    Ok(headers)
}

pub fn parse_reply(body: &Value) -> Result<ParsedReply, LlmError> {
    let raw_text = require_text(body, &CONTENT_PATH, "choices[0].message.content")?;
    let parsed = parse_structured(raw_text, raw_text)?;
    Ok(ParsedReply {
        raw_text: raw_text.to_string(),
        parsed,
        usage: extract_usage(body),
    })
}

pub fn extract_usage(body: &Value) -> Option<TokenUsage> {
    let usage = body.get("usage");
    match as_count(usage.and_then(|u| u.get("total_tokens"))) {
        Some(total) => Some(TokenUsage {
            total_tokens: total,
            input_tokens: as_count(usage.and_then(|u| u.get("prompt_tokens"))),
            output_tokens: as_count(usage.and_then(|u| u.get("completion_tokens"))),
        }),
        None => generic_usage(body),
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
