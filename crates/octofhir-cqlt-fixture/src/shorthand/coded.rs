//! Coded values: `SYSTEM#code Display text`

use super::{ShorthandContext, resolve_code_system};
use crate::error::ShorthandError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static CODED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\s#]+)#(\S+)(?:\s+(.*\S))?\s*$").expect("coded value pattern is valid")
});

/// A parsed coded shorthand, borrowing from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodedValue<'a> {
    /// System alias or URI as written
    pub system: Option<&'a str>,
    pub code: Option<&'a str>,
    pub display: Option<&'a str>,
}

impl<'a> CodedValue<'a> {
    /// Parse `(SYSTEM#CODE)? DISPLAY?`
    pub fn parse(raw: &'a str) -> Result<Self, ShorthandError> {
        let trimmed = raw.trim();
        let malformed = || ShorthandError::MalformedCode { raw: raw.to_string() };

        let first_token = trimmed.split_whitespace().next().ok_or_else(malformed)?;
        // No system before a `#`: the whole text is a display (`#2 grade`)
        let has_system = first_token.split_once('#').is_some_and(|(system, _)| !system.is_empty());
        if !has_system {
            return Ok(Self {
                system: None,
                code: None,
                display: Some(trimmed),
            });
        }

        let captures = CODED.captures(trimmed).ok_or_else(malformed)?;
        Ok(Self {
            system: captures.get(1).map(|m| m.as_str()),
            code: captures.get(2).map(|m| m.as_str()),
            display: captures.get(3).map(|m| m.as_str()),
        })
    }

    fn coding(&self, ctx: &ShorthandContext<'_>) -> Map<String, Value> {
        let mut coding = Map::new();
        if let Some(system) = self.system {
            coding.insert("system".into(), resolve_code_system(system, ctx).into());
        }
        if let Some(code) = self.code {
            coding.insert("code".into(), code.into());
        }
        if let Some(display) = self.display {
            coding.insert("display".into(), display.into());
        }
        coding
    }
}

/// Expand to a `CodeableConcept`: one coding plus text, or text only
pub fn decode_codeable_concept(raw: &str, ctx: &ShorthandContext<'_>) -> Result<Value, ShorthandError> {
    let coded = CodedValue::parse(raw)?;
    let mut concept = Map::new();
    if coded.code.is_some() {
        concept.insert("coding".into(), Value::Array(vec![Value::Object(coded.coding(ctx))]));
    }
    if let Some(display) = coded.display {
        concept.insert("text".into(), display.into());
    }
    Ok(Value::Object(concept))
}

/// Expand to a single `Coding`
pub fn decode_coding(raw: &str, ctx: &ShorthandContext<'_>) -> Result<Value, ShorthandError> {
    Ok(Value::Object(CodedValue::parse(raw)?.coding(ctx)))
}
