//! Declarative cross-parameter conditions
//!
//! Provider quirks such as "temperature is locked while top_p is changed" are
//! kept as data and evaluated here against a map of current values.

use serde::Serialize;

use crate::types::{ParamMap, ParamValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    NotEquals,
    Equals,
}

/// `param <condition> value`, evaluated against current values.
///
/// A missing value never equals the sentinel, so `NotEquals` holds for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamCondition {
    pub param: &'static str,
    pub condition: Condition,
    pub value: ParamValue,
}

impl ParamCondition {
    pub fn not_equals(param: &'static str, value: impl Into<ParamValue>) -> Self {
        Self {
            param,
            condition: Condition::NotEquals,
            value: value.into(),
        }
    }

    pub fn equals(param: &'static str, value: impl Into<ParamValue>) -> Self {
        Self {
            param,
            condition: Condition::Equals,
            value: value.into(),
        }
    }

    pub fn holds(&self, values: &ParamMap) -> bool {
        let current = values.get(self.param);
        match self.condition {
            Condition::Equals => current == Some(&self.value),
            Condition::NotEquals => current != Some(&self.value),
        }
    }
}

/// Locks a parameter while another one is in a conflicting state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionRule {
    #[serde(flatten)]
    pub when: ParamCondition,
    /// Hint telling the user how to unlock the parameter
    pub clear_label: &'static str,
}

impl ExclusionRule {
    pub fn new(when: ParamCondition, clear_label: &'static str) -> Self {
        Self { when, clear_label }
    }

    pub fn blocks(&self, values: &ParamMap) -> bool {
        self.when.holds(values)
    }
}
