//! Resource bundles handed to the CQL executor

use crate::resource::ExpandedResource;
use serde_json::{Value, json};

/// Ordered expanded resources; the first is always the patient
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    resources: Vec<ExpandedResource>,
}

impl Bundle {
    pub(crate) fn new(patient: ExpandedResource, rest: Vec<ExpandedResource>) -> Self {
        let mut resources = Vec::with_capacity(rest.len() + 1);
        resources.push(patient);
        resources.extend(rest);
        Self { resources }
    }

    pub fn patient(&self) -> &ExpandedResource {
        &self.resources[0]
    }

    pub fn patient_id(&self) -> &str {
        self.patient().id()
    }

    pub fn resources(&self) -> &[ExpandedResource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// All resources of one type, in bundle order
    pub fn of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a ExpandedResource> {
        self.resources
            .iter()
            .filter(move |r| r.resource_type() == resource_type)
    }

    /// FHIR `Bundle` of type `collection`
    pub fn to_json(&self) -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": self
                .resources
                .iter()
                .map(|resource| json!({ "resource": resource }))
                .collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resource(resource_type: &str, id: &str) -> ExpandedResource {
        ExpandedResource::new(resource_type, id.to_string())
    }

    #[test]
    fn test_bundle_json() {
        let bundle = Bundle::new(
            resource("Patient", "p"),
            vec![resource("Condition", "c1"), resource("Condition", "c2")],
        );

        assert_eq!(bundle.len(), 3);
        assert_eq!(bundle.patient_id(), "p");
        assert_eq!(bundle.of_type("Condition").count(), 2);
        assert_eq!(
            bundle.to_json(),
            json!({
                "resourceType": "Bundle",
                "type": "collection",
                "entry": [
                    {"resource": {"resourceType": "Patient", "id": "p"}},
                    {"resource": {"resourceType": "Condition", "id": "c1"}},
                    {"resource": {"resourceType": "Condition", "id": "c2"}}
                ]
            })
        );
    }
}
