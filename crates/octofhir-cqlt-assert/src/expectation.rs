//! Expectation parsing and checking
//!
//! An expectation is either a literal value compared structurally against
//! the normalized result, or a directive:
//!
//! - `$should exist` passes when the result is present and not null
//! - `$should have length N` passes when the result has exactly N elements

use crate::error::{AssertionError, AssertionFailure};
use crate::normalize::json_equals;
use crate::value::CqlValue;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const DIRECTIVE_PREFIX: &str = "$should";

static EXIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$should\s+exist\s*$").expect("exist pattern is valid"));
static HAVE_LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$should\s+have\s+length\s+(\d+)\s*$").expect("length pattern is valid")
});

/// A parsed expectation for one expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    Exist,
    HaveLength(usize),
    Equals(Value),
}

impl Expectation {
    /// Parse an authored expectation; unknown `$should` forms are rejected
    pub fn parse(expression: &str, authored: &Value) -> Result<Self, AssertionError> {
        let Some(directive) = authored.as_str().filter(|s| s.starts_with(DIRECTIVE_PREFIX)) else {
            return Ok(Self::Equals(authored.clone()));
        };

        if EXIST.is_match(directive) {
            return Ok(Self::Exist);
        }
        HAVE_LENGTH
            .captures(directive)
            .and_then(|caps| caps[1].parse().ok())
            .map(Self::HaveLength)
            .ok_or_else(|| AssertionError::UnsupportedAssertion {
                expression: expression.to_string(),
                directive: directive.to_string(),
            })
    }

    pub fn holds(&self, actual: Option<&CqlValue>) -> bool {
        match self {
            Self::Exist => actual.is_some_and(|value| !value.is_null()),
            Self::HaveLength(n) => actual.and_then(CqlValue::len) == Some(*n),
            Self::Equals(expected) => json_equals(&normalized(actual), expected),
        }
    }
}

fn normalized(actual: Option<&CqlValue>) -> Value {
    actual.map_or(Value::Null, CqlValue::normalize)
}

/// Check one expression's result against its expectation
pub fn check(expression: &str, actual: Option<&CqlValue>, authored: &Value) -> Result<(), AssertionError> {
    if Expectation::parse(expression, authored)?.holds(actual) {
        return Ok(());
    }
    Err(AssertionError::Mismatch {
        expression: expression.to_string(),
        actual: normalized(actual),
        expected: authored.clone(),
    })
}

/// Check every expectation, collecting failures without stopping at the first
pub fn check_all(
    results: &IndexMap<String, CqlValue>,
    expectations: &IndexMap<String, Value>,
) -> Vec<AssertionFailure> {
    expectations
        .iter()
        .filter_map(|(expression, authored)| {
            check(expression, results.get(expression), authored)
                .err()
                .inspect(|error| log::debug!("expectation failed: {}", error))
                .map(AssertionFailure::from)
        })
        .collect()
}
