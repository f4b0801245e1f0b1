//! Primitive coercions

use super::raw_text;
use crate::error::ShorthandError;
use octofhir_cqlt_schema::RawValue;
use serde_json::{Number, Value};

pub fn decode_boolean(raw: &RawValue) -> Result<Value, ShorthandError> {
    match raw {
        RawValue::Bool(b) => Ok(Value::Bool(*b)),
        RawValue::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        RawValue::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(invalid(other, "boolean")),
    }
}

pub fn decode_integer(raw: &RawValue) -> Result<Value, ShorthandError> {
    match raw {
        RawValue::Integer(i) => Ok(Value::from(*i)),
        RawValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(*f as i64)),
        RawValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid(raw, "integer")),
        other => Err(invalid(other, "integer")),
    }
}

pub fn decode_decimal(raw: &RawValue) -> Result<Value, ShorthandError> {
    let number = match raw {
        RawValue::Integer(i) => Some(Number::from(*i)),
        RawValue::Float(f) => Number::from_f64(*f),
        RawValue::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    };
    number
        .map(Value::Number)
        .ok_or_else(|| invalid(raw, "decimal"))
}

/// Any scalar is accepted and rendered as text
pub fn decode_string(raw: &RawValue) -> Result<Value, ShorthandError> {
    raw.to_scalar_string()
        .map(Value::String)
        .ok_or_else(|| invalid(raw, "string"))
}

fn invalid(raw: &RawValue, expected: &'static str) -> ShorthandError {
    ShorthandError::InvalidPrimitive {
        raw: raw_text(raw),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(RawValue::Bool(false), json!(false))]
    #[case(RawValue::from("TRUE"), json!(true))]
    #[case(RawValue::from(" false "), json!(false))]
    fn test_boolean(#[case] raw: RawValue, #[case] expected: Value) {
        assert_eq!(decode_boolean(&raw).unwrap(), expected);
    }

    #[test]
    fn test_boolean_rejects_other_text() {
        assert_eq!(
            decode_boolean(&RawValue::from("yes")),
            Err(ShorthandError::InvalidPrimitive {
                raw: "yes".into(),
                expected: "boolean"
            })
        );
        assert!(decode_boolean(&RawValue::Integer(1)).is_err());
    }

    #[rstest]
    #[case(RawValue::Integer(3), json!(3))]
    #[case(RawValue::Float(4.0), json!(4))]
    #[case(RawValue::from("-12"), json!(-12))]
    fn test_integer(#[case] raw: RawValue, #[case] expected: Value) {
        assert_eq!(decode_integer(&raw).unwrap(), expected);
    }

    #[rstest]
    #[case(RawValue::Float(4.5))]
    #[case(RawValue::from("4.5"))]
    #[case(RawValue::Bool(true))]
    fn test_integer_rejects(#[case] raw: RawValue) {
        assert!(decode_integer(&raw).is_err());
    }

    #[rstest]
    #[case(RawValue::Integer(3), json!(3))]
    #[case(RawValue::Float(0.25), json!(0.25))]
    #[case(RawValue::from("1.5"), json!(1.5))]
    fn test_decimal(#[case] raw: RawValue, #[case] expected: Value) {
        assert_eq!(decode_decimal(&raw).unwrap(), expected);
    }

    #[test]
    fn test_decimal_rejects_text() {
        assert!(decode_decimal(&RawValue::from("lots")).is_err());
    }

    #[rstest]
    #[case(RawValue::from("final"), json!("final"))]
    #[case(RawValue::Integer(42), json!("42"))]
    #[case(RawValue::Bool(true), json!("true"))]
    fn test_string(#[case] raw: RawValue, #[case] expected: Value) {
        assert_eq!(decode_string(&raw).unwrap(), expected);
    }

    #[test]
    fn test_string_rejects_structures() {
        let raw = RawValue::List(vec![RawValue::from("a")]);
        assert_eq!(
            decode_string(&raw),
            Err(ShorthandError::InvalidPrimitive {
                raw: r#"["a"]"#.into(),
                expected: "string"
            })
        );
    }
}
