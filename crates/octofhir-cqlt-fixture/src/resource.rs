//! Fact records and expanded resources

use crate::error::{ExpansionError, ExpansionResult};
use octofhir_cqlt_schema::{RawMap, RawValue};
use serde::Serialize;
use serde_json::{Map, Value};

pub const RESOURCE_TYPE: &str = "resourceType";
pub const ID: &str = "id";

/// One authored clinical fact, before expansion
#[derive(Debug, Clone, PartialEq)]
pub struct FactRecord {
    pub resource_type: String,
    /// Every field except `resourceType`, in authored order
    pub fields: RawMap,
}

impl FactRecord {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            fields: RawMap::new(),
        }
    }

    /// Add a field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Build from an authored mapping; `resourceType` is required
    pub fn from_raw(raw: RawValue) -> ExpansionResult<Self> {
        let RawValue::Map(mut fields) = raw else {
            return Err(ExpansionError::invalid_fact(format!(
                "expected a mapping, found {}",
                raw.kind_name()
            )));
        };
        let resource_type = match fields.shift_remove(RESOURCE_TYPE) {
            Some(RawValue::String(resource_type)) if !resource_type.trim().is_empty() => resource_type,
            Some(other) => {
                return Err(ExpansionError::invalid_fact(format!(
                    "{RESOURCE_TYPE} must be a string, found {}",
                    other.kind_name()
                )));
            }
            None => {
                return Err(ExpansionError::invalid_fact(format!("missing {RESOURCE_TYPE}")));
            }
        };
        Ok(Self { resource_type, fields })
    }

    pub fn is_patient(&self) -> bool {
        self.resource_type == "Patient"
    }
}

impl TryFrom<Value> for FactRecord {
    type Error = ExpansionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_raw(RawValue::from(value))
    }
}

/// A schema-shaped FHIR resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExpandedResource(Map<String, Value>);

impl ExpandedResource {
    pub(crate) fn new(resource_type: &str, id: String) -> Self {
        let mut fields = Map::new();
        fields.insert(RESOURCE_TYPE.into(), resource_type.into());
        fields.insert(ID.into(), id.into());
        Self(fields)
    }

    pub(crate) fn insert(&mut self, field: String, value: Value) {
        self.0.insert(field, value);
    }

    pub fn resource_type(&self) -> &str {
        self.0.get(RESOURCE_TYPE).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        self.0.get(ID).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }

    /// Feed the resource back in as a fact record
    pub fn to_fact(&self) -> ExpansionResult<FactRecord> {
        FactRecord::try_from(self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fact_from_raw() {
        let fact = FactRecord::try_from(json!({
            "resourceType": "Condition",
            "code": "SNOMED#38341003 Hypertension",
            "onset": "2010-01-01"
        }))
        .unwrap();
        assert_eq!(fact.resource_type, "Condition");
        assert_eq!(fact.fields.keys().collect::<Vec<_>>(), ["code", "onset"]);
        assert!(!fact.is_patient());
    }

    #[test]
    fn test_fact_requires_resource_type() {
        let err = FactRecord::try_from(json!({"code": "x"})).unwrap_err();
        assert_eq!(err, ExpansionError::invalid_fact("missing resourceType"));

        let err = FactRecord::try_from(json!({"resourceType": 3})).unwrap_err();
        assert!(err.to_string().contains("must be a string"));

        let err = FactRecord::from_raw(RawValue::from("Patient")).unwrap_err();
        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn test_fact_builder() {
        let fact = FactRecord::new("Patient").with("gender", "female").with("active", true);
        assert!(fact.is_patient());
        assert_eq!(fact.fields["active"], RawValue::Bool(true));
    }

    #[test]
    fn test_expanded_resource_accessors() {
        let mut resource = ExpandedResource::new("Patient", "p-1".into());
        resource.insert("gender".into(), json!("male"));
        assert_eq!(resource.resource_type(), "Patient");
        assert_eq!(resource.id(), "p-1");
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({"resourceType": "Patient", "id": "p-1", "gender": "male"})
        );
        assert_eq!(resource.to_fact().unwrap().fields["id"], RawValue::from("p-1"));
    }
}
