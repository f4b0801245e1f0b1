//! Canonical JSON form of CQL values
//!
//! Expectations are authored as plain YAML, so results are flattened into
//! the same shape before comparison: temporal values become ISO strings,
//! clinical types become plain mappings, and containers recurse.

use crate::value::{CqlCode, CqlQuantity, CqlValue};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value, json};

impl CqlValue {
    /// Canonical comparable form of this value
    pub fn normalize(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Decimal(d) => decimal_to_json(*d),
            Self::String(s) => Value::String(s.clone()),
            Self::Date(d) => Value::String(d.to_string()),
            Self::DateTime(dt) => Value::String(dt.to_string()),
            Self::Time(t) => Value::String(t.to_string()),
            Self::Quantity(q) => quantity_to_json(q),
            Self::Ratio(r) => json!({
                "numerator": quantity_to_json(&r.numerator),
                "denominator": quantity_to_json(&r.denominator),
            }),
            Self::Code(c) => code_to_json(c),
            Self::Concept(c) => {
                let mut map = Map::new();
                map.insert("codes".into(), c.codes.iter().map(code_to_json).collect());
                if let Some(display) = &c.display {
                    map.insert("display".into(), Value::String(display.clone()));
                }
                Value::Object(map)
            }
            Self::Interval(i) => json!({
                "low": i.low.as_deref().map_or(Value::Null, CqlValue::normalize),
                "high": i.high.as_deref().map_or(Value::Null, CqlValue::normalize),
                "lowClosed": i.low_closed,
                "highClosed": i.high_closed,
            }),
            Self::List(items) => items.iter().map(CqlValue::normalize).collect(),
            Self::Tuple(elements) => Value::Object(
                elements
                    .iter()
                    .map(|(name, value)| (name.clone(), value.normalize()))
                    .collect(),
            ),
            Self::Resource(resource) => resource.clone(),
        }
    }
}

/// Whole decimals become integers, the rest floats
pub fn decimal_to_json(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return Value::from(i);
        }
    }
    d.to_f64()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(d.to_string()), Value::Number)
}

fn quantity_to_json(q: &CqlQuantity) -> Value {
    let mut map = Map::new();
    map.insert("value".into(), decimal_to_json(q.value));
    if let Some(unit) = &q.unit {
        map.insert("unit".into(), Value::String(unit.clone()));
    }
    Value::Object(map)
}

fn code_to_json(c: &CqlCode) -> Value {
    let mut map = Map::new();
    map.insert("code".into(), Value::String(c.code.clone()));
    map.insert("system".into(), Value::String(c.system.clone()));
    if let Some(version) = &c.version {
        map.insert("version".into(), Value::String(version.clone()));
    }
    if let Some(display) = &c.display {
        map.insert("display".into(), Value::String(display.clone()));
    }
    Value::Object(map)
}

/// Deep structural equality where numbers compare by value (`5 == 5.0`)
pub fn json_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equals(x, y)))
        }
        _ => actual == expected,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}
