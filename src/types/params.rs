//! Submitted hyperparameter values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::LlmError;

/// A single submitted or default parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

/// Parameter key to value, ordered by key.
pub type ParamMap = BTreeMap<String, ParamValue>;

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// JSON rendering used when the value is copied into a wire payload.
    ///
    /// Whole numbers are emitted as integers so `max_tokens: 4096` does not
    /// become `4096.0`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::from(*n as i64)
            }
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Build a [`ParamMap`] from a JSON object as posted by a UI.
///
/// `null` entries mean "cleared" and are dropped; anything other than a
/// number or string is rejected.
pub fn param_map_from_json(value: &serde_json::Value) -> Result<ParamMap, LlmError> {
    let obj = value.as_object().ok_or_else(|| {
        LlmError::InvalidParameter("hyperparameters must be a JSON object".to_string())
    })?;

    let mut out = ParamMap::new();
    for (key, v) in obj {
        match v {
            serde_json::Value::Null => {}
            serde_json::Value::Number(n) => {
                let n = n.as_f64().ok_or_else(|| {
                    LlmError::InvalidParameter(format!("{key} is not a finite number"))
                })?;
                out.insert(key.clone(), ParamValue::Number(n));
            }
            serde_json::Value::String(s) => {
                out.insert(key.clone(), ParamValue::Text(s.clone()));
            }
            other => {
                return Err(LlmError::InvalidParameter(format!(
                    "{key} must be a number or string, got {other}"
                )));
            }
        }
    }
    Ok(out)
}
