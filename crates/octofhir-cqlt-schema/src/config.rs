//! Per-resource configuration overlay
//!
//! The overlay document lists, per resource type, which field points back at
//! the patient, which defaults to apply, and which alias names fixtures may
//! use. A default is either a literal or a conditional of the form
//!
//! ```yaml
//! clinicalStatus:
//!   $if-present: abatementDateTime
//!   $then: resolved
//!   $else: active
//! ```

use crate::error::SchemaError;
use crate::value::{RawMap, RawValue};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

const IF_PRESENT: &str = "$if-present";
const THEN: &str = "$then";
const ELSE: &str = "$else";

/// Configuration overlay for one resource type at one schema version
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// Field holding the back-reference to the patient
    #[serde(default)]
    pub patient: Option<String>,
    /// Field name -> default value
    #[serde(default)]
    pub defaults: IndexMap<String, DefaultValue>,
    /// Alias name -> canonical field name
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
}

impl ResourceConfig {
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }
}

/// A configured default value
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(RawValue),
    /// `then` when `condition_field` is present in the input, else `otherwise`
    Conditional {
        condition_field: String,
        then: RawValue,
        otherwise: RawValue,
    },
}

impl DefaultValue {
    /// Pick the value to apply, judged against the fixture's own fields
    pub fn resolve<'a>(&'a self, input: &RawMap) -> &'a RawValue {
        match self {
            Self::Literal(value) => value,
            Self::Conditional {
                condition_field,
                then,
                otherwise,
            } => {
                let present = input.get(condition_field).is_some_and(|v| !v.is_null());
                if present { then } else { otherwise }
            }
        }
    }

    /// Field the default depends on, if conditional
    pub fn condition_field(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Conditional { condition_field, .. } => Some(condition_field),
        }
    }
}

impl TryFrom<RawValue> for DefaultValue {
    type Error = String;

    fn try_from(raw: RawValue) -> Result<Self, Self::Error> {
        let map = match raw {
            RawValue::Map(map) if map.contains_key(IF_PRESENT) => map,
            other => return Ok(Self::Literal(other)),
        };

        let mut condition_field = None;
        let mut then = RawValue::Null;
        let mut otherwise = RawValue::Null;
        for (key, value) in map {
            match key.as_str() {
                IF_PRESENT => match value {
                    RawValue::String(field) => condition_field = Some(field),
                    other => {
                        return Err(format!("{IF_PRESENT} expects a field name, found {}", other.kind_name()));
                    }
                },
                THEN => then = value,
                ELSE => otherwise = value,
                unknown => return Err(format!("unexpected key '{unknown}' in conditional default")),
            }
        }

        Ok(Self::Conditional {
            condition_field: condition_field.unwrap_or_default(),
            then,
            otherwise,
        })
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawValue::deserialize(deserializer)?;
        DefaultValue::try_from(raw).map_err(D::Error::custom)
    }
}

/// Parse an overlay document into per-resource configs
pub fn parse_config(
    source_name: &str,
    yaml: &str,
) -> Result<IndexMap<String, ResourceConfig>, SchemaError> {
    let blank = yaml
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if blank {
        return Ok(IndexMap::new());
    }

    let document: Option<IndexMap<String, Option<ResourceConfig>>> =
        serde_yaml::from_str(yaml).map_err(|e| SchemaError::parse(source_name, e))?;

    Ok(document
        .unwrap_or_default()
        .into_iter()
        .map(|(resource_type, config)| (resource_type, config.unwrap_or_default()))
        .collect())
}
