//! CQL result values
//!
//! `CqlValue` is what a CQL executor hands back for each named expression.
//! It mirrors the CQL system types closely enough that an expectation can be
//! checked against its canonical JSON form (see [`crate::normalize`]).

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value produced by evaluating a CQL expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
    Date(CqlDate),
    DateTime(CqlDateTime),
    Time(CqlTime),
    Quantity(CqlQuantity),
    Ratio(CqlRatio),
    Code(CqlCode),
    Concept(CqlConcept),
    Interval(CqlInterval),
    List(Vec<CqlValue>),
    /// Named elements, insertion order preserved
    Tuple(IndexMap<String, CqlValue>),
    /// A FHIR resource or element returned as-is
    Resource(serde_json::Value),
}

impl CqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Element count for lists, character count for strings
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::List(items) => Some(items.len()),
            Self::String(s) => Some(s.chars().count()),
            Self::Resource(serde_json::Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CqlValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::Date(_) => "Date",
            Self::DateTime(_) => "DateTime",
            Self::Time(_) => "Time",
            Self::Quantity(_) => "Quantity",
            Self::Ratio(_) => "Ratio",
            Self::Code(_) => "Code",
            Self::Concept(_) => "Concept",
            Self::Interval(_) => "Interval",
            Self::List(_) => "List",
            Self::Tuple(_) => "Tuple",
            Self::Resource(_) => "Resource",
        }
    }
}

impl From<bool> for CqlValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for CqlValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<Decimal> for CqlValue {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for CqlValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CqlValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<CqlValue>> From<Vec<T>> for CqlValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// JSON results from executors that speak plain JSON. Objects carrying a
/// `resourceType` are kept as resources; other objects become tuples.
impl From<serde_json::Value> for CqlValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n
                    .as_f64()
                    .and_then(|f| Decimal::try_from(f).ok())
                    .map_or(Self::Null, Self::Decimal),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) if map.contains_key("resourceType") => {
                Self::Resource(Value::Object(map))
            }
            Value::Object(map) => {
                Self::Tuple(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Date(d) => write!(f, "@{d}"),
            Self::DateTime(dt) => write!(f, "@{dt}"),
            Self::Time(t) => write!(f, "@T{t}"),
            Self::Quantity(q) => write!(f, "{q}"),
            Self::Ratio(r) => write!(f, "{r}"),
            Self::Code(c) => write!(f, "{c}"),
            Self::Concept(c) => write!(f, "{c}"),
            Self::Interval(i) => write!(f, "Interval{i}"),
            Self::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Self::Tuple(elements) => {
                write!(f, "Tuple {{ ")?;
                for (i, (name, value)) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, " }}")
            }
            Self::Resource(resource) => write!(f, "{resource}"),
        }
    }
}

// ============================================================================
// Temporal Types
// ============================================================================

/// CQL Date with year, month or day precision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CqlDate {
    pub year: i32,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl CqlDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
        }
    }

    pub fn year_only(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn year_month(year: i32, month: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`, with an optional `@` prefix
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('@').unwrap_or(s);
        let mut parts = s.split('-');
        let year = parts.next()?.parse().ok()?;
        let month = parts.next().map(str::parse).transpose().ok()?;
        let day = parts.next().map(str::parse).transpose().ok()?;
        if parts.next().is_some() || (month.is_none() && day.is_some()) {
            return None;
        }
        Some(Self { year, month, day })
    }
}

impl From<NaiveDate> for CqlDate {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month() as u8, date.day() as u8)
    }
}

impl fmt::Display for CqlDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
            if let Some(day) = self.day {
                write!(f, "-{:02}", day)?;
            }
        }
        Ok(())
    }
}

/// CQL DateTime with precision down to the millisecond
///
/// `timezone_offset` is in minutes east of UTC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CqlDateTime {
    pub year: i32,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub millisecond: Option<u16>,
    pub timezone_offset: Option<i16>,
}

impl CqlDateTime {
    pub fn new(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        timezone_offset: Option<i16>,
    ) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
            hour: Some(hour),
            minute: Some(minute),
            second: Some(second),
            millisecond: Some(millisecond),
            timezone_offset,
        }
    }

    pub fn date(&self) -> CqlDate {
        CqlDate {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

impl From<DateTime<FixedOffset>> for CqlDateTime {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        let offset_minutes = dt.offset().local_minus_utc() / 60;
        Self::new(
            dt.year(),
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            (dt.nanosecond() / 1_000_000).min(999) as u16,
            Some(offset_minutes as i16),
        )
    }
}

impl fmt::Display for CqlDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date())?;
        let Some(hour) = self.hour else {
            return Ok(());
        };
        write!(f, "T{:02}", hour)?;
        if let Some(minute) = self.minute {
            write!(f, ":{:02}", minute)?;
            if let Some(second) = self.second {
                write!(f, ":{:02}", second)?;
                if let Some(ms) = self.millisecond {
                    write!(f, ".{:03}", ms)?;
                }
            }
        }
        match self.timezone_offset {
            Some(0) => write!(f, "Z"),
            Some(offset) => {
                let sign = if offset >= 0 { '+' } else { '-' };
                write!(f, "{}{:02}:{:02}", sign, offset.abs() / 60, offset.abs() % 60)
            }
            None => Ok(()),
        }
    }
}

/// CQL Time with hour to millisecond precision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CqlTime {
    pub hour: u8,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub millisecond: Option<u16>,
}

impl CqlTime {
    pub fn new(hour: u8, minute: u8, second: u8, millisecond: u16) -> Self {
        Self {
            hour,
            minute: Some(minute),
            second: Some(second),
            millisecond: Some(millisecond),
        }
    }
}

impl From<NaiveTime> for CqlTime {
    fn from(time: NaiveTime) -> Self {
        Self::new(
            time.hour() as u8,
            time.minute() as u8,
            time.second() as u8,
            (time.nanosecond() / 1_000_000).min(999) as u16,
        )
    }
}

impl fmt::Display for CqlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.hour)?;
        if let Some(minute) = self.minute {
            write!(f, ":{:02}", minute)?;
            if let Some(second) = self.second {
                write!(f, ":{:02}", second)?;
                if let Some(ms) = self.millisecond {
                    write!(f, ".{:03}", ms)?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Clinical Types
// ============================================================================

/// CQL Quantity with an optional UCUM unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CqlQuantity {
    pub value: Decimal,
    pub unit: Option<String>,
}

impl CqlQuantity {
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: Some(unit.into()),
        }
    }

    pub fn unitless(value: Decimal) -> Self {
        Self { value, unit: None }
    }
}

impl fmt::Display for CqlQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(unit) = &self.unit {
            write!(f, " '{}'", unit)?;
        }
        Ok(())
    }
}

/// Ratio of two quantities, e.g. `1 'mg' : 1 'mL'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CqlRatio {
    pub numerator: CqlQuantity,
    pub denominator: CqlQuantity,
}

impl CqlRatio {
    pub fn new(numerator: CqlQuantity, denominator: CqlQuantity) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl fmt::Display for CqlRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.numerator, self.denominator)
    }
}

/// A code from a code system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CqlCode {
    pub code: String,
    pub system: String,
    pub version: Option<String>,
    pub display: Option<String>,
}

impl CqlCode {
    pub fn new(code: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            system: system.into(),
            version: None,
            display: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

impl fmt::Display for CqlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code '{}' from \"{}\"", self.code, self.system)?;
        if let Some(display) = &self.display {
            write!(f, " display '{}'", display)?;
        }
        Ok(())
    }
}

/// A set of equivalent codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CqlConcept {
    pub codes: Vec<CqlCode>,
    pub display: Option<String>,
}

impl CqlConcept {
    pub fn new(codes: impl IntoIterator<Item = CqlCode>, display: Option<impl Into<String>>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
            display: display.map(Into::into),
        }
    }

    pub fn from_code(code: CqlCode) -> Self {
        let display = code.display.clone();
        Self {
            codes: vec![code],
            display,
        }
    }
}

impl fmt::Display for CqlConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concept {{")?;
        for (i, code) in self.codes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", code)?;
        }
        write!(f, "}}")?;
        if let Some(display) = &self.display {
            write!(f, " display '{}'", display)?;
        }
        Ok(())
    }
}

/// Range between two points; a missing bound is unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CqlInterval {
    pub low: Option<Box<CqlValue>>,
    pub low_closed: bool,
    pub high: Option<Box<CqlValue>>,
    pub high_closed: bool,
}

impl CqlInterval {
    pub fn new(low: Option<CqlValue>, low_closed: bool, high: Option<CqlValue>, high_closed: bool) -> Self {
        Self {
            low: low.map(Box::new),
            low_closed,
            high: high.map(Box::new),
            high_closed,
        }
    }

    /// `[low, high]`
    pub fn closed(low: CqlValue, high: CqlValue) -> Self {
        Self::new(Some(low), true, Some(high), true)
    }
}

impl fmt::Display for CqlInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.low_closed { "[ " } else { "( " })?;
        match &self.low {
            Some(low) => write!(f, "{}", low)?,
            None => write!(f, "null")?,
        }
        write!(f, ", ")?;
        match &self.high {
            Some(high) => write!(f, "{}", high)?,
            None => write!(f, "null")?,
        }
        write!(f, "{}", if self.high_closed { " ]" } else { " )" })
    }
}
