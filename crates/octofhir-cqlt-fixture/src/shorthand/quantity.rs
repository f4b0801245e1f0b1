//! Quantities: `NUMBER (UNIT)?`

use crate::error::ShorthandError;
use octofhir_cqlt_schema::RawValue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)(?:\s+(\S.*?))?\s*$")
        .expect("quantity pattern is valid")
});

/// Expand `25 mg` to `{value: 25.0, unit: "mg"}`; numbers give `{value}`
pub fn decode_quantity(raw: &RawValue) -> Result<Value, ShorthandError> {
    match raw {
        RawValue::Integer(i) => Ok(quantity(Number::from(*i), None)),
        RawValue::Float(f) => number(*f)
            .map(|n| quantity(n, None))
            .ok_or_else(|| malformed(&f.to_string())),
        RawValue::String(s) => parse_quantity(s),
        other => Err(malformed(&super::raw_text(other))),
    }
}

fn parse_quantity(raw: &str) -> Result<Value, ShorthandError> {
    let captures = QUANTITY.captures(raw.trim()).ok_or_else(|| malformed(raw))?;
    let value = captures[1]
        .parse::<f64>()
        .ok()
        .and_then(number)
        .ok_or_else(|| malformed(raw))?;
    Ok(quantity(value, captures.get(2).map(|m| m.as_str())))
}

fn quantity(value: Number, unit: Option<&str>) -> Value {
    let mut quantity = Map::new();
    quantity.insert("value".into(), Value::Number(value));
    if let Some(unit) = unit {
        quantity.insert("unit".into(), unit.into());
    }
    Value::Object(quantity)
}

fn number(value: f64) -> Option<Number> {
    Number::from_f64(value)
}

fn malformed(raw: &str) -> ShorthandError {
    ShorthandError::MalformedQuantity { raw: raw.to_string() }
}
