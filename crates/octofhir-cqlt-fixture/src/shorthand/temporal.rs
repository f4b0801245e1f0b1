//! Dates, times and periods
//!
//! Strings pass through unchanged; native chrono values are rendered as the
//! ISO-8601 slice the target type needs.

use super::raw_text;
use crate::error::ShorthandError;
use octofhir_cqlt_schema::{RawValue, format_date, format_datetime, format_time};
use serde_json::{Map, Value};

const PERIOD_SEPARATOR: &str = " - ";

/// Expand to a FHIR `date`
pub fn decode_date(raw: &RawValue) -> Result<Value, ShorthandError> {
    match raw {
        RawValue::String(s) => Ok(s.as_str().into()),
        RawValue::Integer(year) => Ok(year.to_string().into()),
        RawValue::Date(date) => Ok(format_date(date).into()),
        RawValue::DateTime(datetime) => Ok(format_date(&datetime.date_naive()).into()),
        other => Err(invalid(other, "date")),
    }
}

/// Expand to a FHIR `dateTime` or `instant`
pub fn decode_datetime(raw: &RawValue) -> Result<Value, ShorthandError> {
    match raw {
        RawValue::String(s) => Ok(s.as_str().into()),
        RawValue::Integer(year) => Ok(year.to_string().into()),
        RawValue::Date(date) => Ok(format_date(date).into()),
        RawValue::DateTime(datetime) => Ok(format_datetime(datetime).into()),
        other => Err(invalid(other, "dateTime")),
    }
}

/// Expand to a FHIR `time`
pub fn decode_time(raw: &RawValue) -> Result<Value, ShorthandError> {
    match raw {
        RawValue::String(s) => Ok(s.as_str().into()),
        RawValue::Time(time) => Ok(format_time(time).into()),
        RawValue::DateTime(datetime) => Ok(format_time(&datetime.time()).into()),
        other => Err(invalid(other, "time")),
    }
}

/// Expand `start` or `start - end` to a `Period`
pub fn decode_period(raw: &RawValue) -> Result<Value, ShorthandError> {
    let mut period = Map::new();
    match raw {
        RawValue::String(s) => {
            let malformed = || ShorthandError::MalformedPeriod { raw: s.clone() };
            let (start, end) = match s.split_once(PERIOD_SEPARATOR) {
                Some((start, end)) => (start.trim(), Some(end.trim())),
                None => (s.trim(), None),
            };
            if start.is_empty() || end.is_some_and(str::is_empty) {
                return Err(malformed());
            }
            period.insert("start".into(), start.into());
            if let Some(end) = end {
                period.insert("end".into(), end.into());
            }
        }
        RawValue::Date(_) | RawValue::DateTime(_) => {
            period.insert("start".into(), decode_datetime(raw)?);
        }
        other => {
            return Err(ShorthandError::MalformedPeriod { raw: raw_text(other) });
        }
    }
    Ok(Value::Object(period))
}

fn invalid(raw: &RawValue, expected: &'static str) -> ShorthandError {
    ShorthandError::InvalidTemporal {
        raw: raw_text(raw),
        expected,
    }
}
