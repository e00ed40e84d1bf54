//! Helpers shared by the dialect modules

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::error::LlmError;
use crate::types::{ParamMap, ParamValue, TokenUsage};

/// Text, structured content and usage pulled out of a provider reply.
#[derive(Debug, Clone)]
pub struct ParsedReply {
    pub raw_text: String,
    pub parsed: Map<String, Value>,
    pub usage: Option<TokenUsage>,
}

/// Remove Markdown code-fence markers around a JSON answer.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Decode reply text into a JSON object.
///
/// Errors carry the original text, not the cleaned one.
pub fn parse_structured(raw_text: &str, cleaned: &str) -> Result<Map<String, Value>, LlmError> {
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LlmError::malformed(
            format!("expected a JSON object, got {}", json_kind(&other)),
            raw_text,
        )),
        Err(e) => Err(LlmError::malformed(
            format!("reply is not valid JSON: {e}"),
            raw_text,
        )),
    }
}

/// Follow a path of object keys and array indices to a string.
pub fn text_at<'a>(body: &'a Value, path: &[PathSeg]) -> Option<&'a str> {
    let mut cur = body;
    for seg in path {
        cur = match seg {
            PathSeg::Key(k) => cur.get(k)?,
            PathSeg::Index(i) => cur.get(i)?,
        };
    }
    cur.as_str()
}

#[derive(Debug, Clone, Copy)]
pub enum PathSeg {
    Key(&'static str),
    Index(usize),
}

/// Reply text at `path`, or a malformed-response error carrying the whole body.
pub fn require_text<'a>(
    body: &'a Value,
    path: &[PathSeg],
    described: &str,
) -> Result<&'a str, LlmError> {
    text_at(body, path)
        .ok_or_else(|| LlmError::malformed(format!("missing {described}"), body.to_string()))
}

pub fn as_count(v: Option<&Value>) -> Option<u64> {
    v.and_then(Value::as_u64)
}

/// Last-resort usage lookup across the field spellings providers use.
pub fn generic_usage(body: &Value) -> Option<TokenUsage> {
    let usage = ["usage", "usageMetadata", "usage_metadata"]
        .iter()
        .find_map(|k| body.get(*k).filter(|v| v.is_object()))?;

    let total = ["total_tokens", "totalTokenCount", "total_token_count"]
        .iter()
        .find_map(|k| as_count(usage.get(*k)));
    let input = as_count(usage.get("input_tokens"));
    let output = as_count(usage.get("output_tokens"));

    match (total, input, output) {
        (Some(total), input, output) => Some(TokenUsage {
            total_tokens: total,
            input_tokens: input,
            output_tokens: output,
        }),
        (None, Some(i), Some(o)) => Some(TokenUsage::split(i, o)),
        _ => None,
    }
}

/// Copy a submitted value into a payload under a (possibly renamed) key.
pub fn copy_param(
    params: &ParamMap,
    from: &str,
    body: &mut Map<String, Value>,
    to: &str,
) {
    if let Some(v) = params.get(from) {
        body.insert(to.to_string(), v.to_json());
    }
}

/// Read numeric fields back out of a hand-edited payload.
pub fn read_params(source: Option<&Value>, mapping: &[(&str, &str)]) -> ParamMap {
    let mut out = ParamMap::new();
    if let Some(obj) = source.and_then(Value::as_object) {
        for (wire, key) in mapping {
            if let Some(n) = obj.get(*wire).and_then(Value::as_f64) {
                out.insert((*key).to_string(), ParamValue::Number(n));
            }
        }
    }
    out
}

/// Header value carrying a credential, flagged sensitive.
pub fn secret_header(prefix: &str, credential: &SecretString) -> Result<HeaderValue, LlmError> {
    let mut value = HeaderValue::from_str(&format!("{prefix}{}", credential.expose_secret()))
        .map_err(|_| {
            LlmError::Configuration(
                "credential contains characters that are not valid in an HTTP header".to_string(),
            )
        })?;
    value.set_sensitive(true);
    Ok(value)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
