//! Structure-definition loading
//!
//! Reads FHIR `Bundle`s of `StructureDefinition`s and turns each snapshot
//! into indexed `ResourceDefinition`s. Elements nested below a backbone
//! element (`Observation.component.code`) produce a separate definition
//! named by the backbone's path (`Observation.component`).
//!
//! Only base specializations become definitions. Primitive types, abstract
//! bases (`Resource`, `Element`), logical models and constraint profiles
//! (`SimpleQuantity`, `vitalsigns`) are skipped; constrained quantities
//! resolve to `Quantity` through their type code.
//!
//! An element may reuse another backbone's layout instead of declaring a
//! type: `contentReference: "#Observation.referenceRange"` (STU3 and
//! later) or `nameReference: "referenceRange"` (DSTU2).

use crate::definition::{Cardinality, DefinitionKind, FieldDefinition, ResourceDefinition, TypeKind, ValueType};
use crate::error::SchemaError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct BundleDocument {
    #[serde(default)]
    entry: Vec<BundleEntry>,
}

#[derive(Debug, Deserialize)]
struct BundleEntry {
    resource: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructureDefinitionDocument {
    name: String,
    kind: String,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default)]
    derivation: Option<String>,
    /// DSTU2 marker of a constraint profile
    #[serde(default)]
    constrained_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    snapshot: Option<SnapshotDocument>,
}

impl StructureDefinitionDocument {
    fn is_base_specialization(&self) -> bool {
        let primitive = self.kind == "primitive-type"
            || (self.kind == "datatype" && self.name.starts_with(|c: char| c.is_ascii_lowercase()));
        let constraint = self.derivation.as_deref() == Some("constraint") || self.constrained_type.is_some();
        !(primitive || constraint || self.is_abstract || self.kind == "logical")
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    element: Vec<ElementDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementDocument {
    path: String,
    /// DSTU2 element name, the target of `nameReference`
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    min: u32,
    #[serde(default)]
    max: Option<String>,
    #[serde(default, rename = "type")]
    types: Vec<TypeRefDocument>,
    #[serde(default)]
    content_reference: Option<String>,
    #[serde(default)]
    name_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeRefDocument {
    /// Absent on some STU3 primitive value elements
    #[serde(default)]
    code: Option<String>,
}

/// Parse every structure definition in a bundle document
pub fn parse_structure_definitions(
    source_name: &str,
    json: &str,
) -> Result<Vec<ResourceDefinition>, SchemaError> {
    let bundle: BundleDocument =
        serde_json::from_str(json).map_err(|e| SchemaError::parse(source_name, e))?;

    let mut definitions = Vec::new();
    for resource in bundle.entry.into_iter().filter_map(|e| e.resource) {
        definitions.extend(parse_structure_definition(source_name, resource)?);
    }
    Ok(definitions)
}

/// Parse one resource; anything other than a base `StructureDefinition`
/// yields no definitions
pub fn parse_structure_definition(
    source_name: &str,
    resource: serde_json::Value,
) -> Result<Vec<ResourceDefinition>, SchemaError> {
    if resource.get("resourceType").and_then(|v| v.as_str()) != Some("StructureDefinition") {
        return Ok(Vec::new());
    }
    let document: StructureDefinitionDocument =
        serde_json::from_value(resource).map_err(|e| SchemaError::parse(source_name, e))?;
    if !document.is_base_specialization() {
        log::trace!("skipping {} ({})", document.name, document.kind);
        return Ok(Vec::new());
    }
    build_definitions(source_name, document)
}

fn build_definitions(
    source_name: &str,
    document: StructureDefinitionDocument,
) -> Result<Vec<ResourceDefinition>, SchemaError> {
    let kind = match document.kind.as_str() {
        "resource" => DefinitionKind::Resource,
        _ => DefinitionKind::ComplexType,
    };
    let mut root = ResourceDefinition::new(&document.name, kind);
    if let Some(description) = document.description {
        root = root.with_description(description);
    }

    // Keyed by parent path; the root type's own path comes first.
    let mut definitions: IndexMap<String, ResourceDefinition> = IndexMap::new();
    definitions.insert(document.name.clone(), root);

    let elements = document.snapshot.map(|s| s.element).unwrap_or_default();
    let named_paths: HashMap<&str, &str> = elements
        .iter()
        .filter_map(|e| Some((e.name.as_deref()?, e.path.as_str())))
        .collect();

    let mut references = Vec::new();
    for element in &elements {
        let Some((parent, _)) = element.path.rsplit_once('.') else {
            continue;
        };
        let Some(definition) = definitions.get_mut(parent) else {
            return Err(SchemaError::parse(
                source_name,
                format!("element {} appears before its parent", element.path),
            ));
        };

        let max = element.max.as_deref().unwrap_or("1");
        let cardinality = Cardinality::from_bounds(element.min, max).ok_or_else(|| {
            SchemaError::parse(source_name, format!("invalid max '{}' on {}", max, element.path))
        })?;

        let target = match (&element.content_reference, &element.name_reference) {
            (Some(reference), _) => Some(content_reference_path(reference).to_string()),
            (None, Some(name)) => Some(
                named_paths
                    .get(name.as_str())
                    .map(|path| path.to_string())
                    .ok_or_else(|| {
                        SchemaError::parse(
                            source_name,
                            format!("element {} references unknown name '{}'", element.path, name),
                        )
                    })?,
            ),
            (None, None) => None,
        };

        let field = match target {
            Some(target) => {
                references.push((element.path.clone(), target.clone()));
                FieldDefinition::referencing(element.path.clone(), cardinality, target)
            }
            None => {
                let types: Vec<ValueType> = element
                    .types
                    .iter()
                    .filter_map(|t| t.code.as_deref())
                    .map(ValueType::new)
                    .collect();
                if types.is_empty() {
                    return Err(SchemaError::parse(
                        source_name,
                        format!("element {} declares no type", element.path),
                    ));
                }
                FieldDefinition::new(element.path.clone(), cardinality, types)
            }
        };

        let opens_backbone =
            field.content_reference.is_none() && field.types.iter().any(|t| t.kind() == TypeKind::Backbone);
        if !definition.push_field(field) {
            return Err(SchemaError::parse(
                source_name,
                format!("duplicate element {}", element.path),
            ));
        }
        if opens_backbone {
            definitions.insert(
                element.path.clone(),
                ResourceDefinition::new(element.path.clone(), DefinitionKind::Backbone),
            );
        }
    }

    for (path, target) in references {
        if !definitions.contains_key(&target) {
            return Err(SchemaError::parse(
                source_name,
                format!("element {path} references {target}, which is not a backbone element"),
            ));
        }
    }

    Ok(definitions.into_values().collect())
}

/// `#Observation.referenceRange`, or the same fragment on a canonical URL
fn content_reference_path(reference: &str) -> &str {
    reference.rsplit_once('#').map_or(reference, |(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn bundle(resource: serde_json::Value) -> String {
        json!({"resourceType": "Bundle", "entry": [{"resource": resource}]}).to_string()
    }

    #[test]
    fn test_parse_resource_with_backbone() {
        let source = bundle(json!({
            "resourceType": "StructureDefinition",
            "name": "Encounter",
            "kind": "resource",
            "description": "An interaction",
            "snapshot": {"element": [
                {"path": "Encounter", "min": 0, "max": "*"},
                {"path": "Encounter.status", "min": 1, "max": "1", "type": [{"code": "code"}]},
                {"path": "Encounter.location", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                {"path": "Encounter.location.location", "min": 1, "max": "1", "type": [{"code": "Reference"}]}
            ]}
        }));

        let definitions = parse_structure_definitions("test", &source).unwrap();
        assert_eq!(definitions.len(), 2);

        let encounter = &definitions[0];
        assert_eq!(encounter.kind, DefinitionKind::Resource);
        assert_eq!(encounter.description.as_deref(), Some("An interaction"));
        assert_eq!(encounter.field("status").unwrap().cardinality, Cardinality::ExactlyOne);
        assert!(encounter.field("location").unwrap().cardinality.is_many());

        let location = &definitions[1];
        assert_eq!(location.name, "Encounter.location");
        assert_eq!(location.kind, DefinitionKind::Backbone);
        assert!(location.field("location").is_some());
    }

    #[test]
    fn test_content_reference_reuses_backbone() {
        let source = bundle(json!({
            "resourceType": "StructureDefinition",
            "name": "Observation",
            "kind": "resource",
            "derivation": "specialization",
            "snapshot": {"element": [
                {"path": "Observation", "min": 0, "max": "*"},
                {"path": "Observation.referenceRange", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                {"path": "Observation.referenceRange.low", "min": 0, "max": "1",
                 "type": [{"code": "Quantity", "profile": ["http://hl7.org/fhir/StructureDefinition/SimpleQuantity"]}]},
                {"path": "Observation.component", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                {"path": "Observation.component.code", "min": 1, "max": "1", "type": [{"code": "CodeableConcept"}]},
                {"path": "Observation.component.referenceRange", "min": 0, "max": "*",
                 "contentReference": "#Observation.referenceRange"}
            ]}
        }));

        let definitions = parse_structure_definitions("profiles-resources.json", &source).unwrap();
        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Observation", "Observation.referenceRange", "Observation.component"]);

        let range = definitions[2].field("referenceRange").unwrap();
        assert!(range.cardinality.is_many());
        assert_eq!(range.structure_path(), "Observation.referenceRange");
        assert_eq!(range.types[0].kind(), TypeKind::Backbone);
    }

    #[test]
    fn test_name_reference_reuses_backbone() {
        let source = bundle(json!({
            "resourceType": "StructureDefinition",
            "name": "Observation",
            "kind": "resource",
            "constrainedType": null,
            "snapshot": {"element": [
                {"path": "Observation", "min": 0, "max": "*"},
                {"path": "Observation.referenceRange", "name": "referenceRange", "min": 0, "max": "*",
                 "type": [{"code": "BackboneElement"}]},
                {"path": "Observation.referenceRange.text", "min": 0, "max": "1", "type": [{"code": "string"}]},
                {"path": "Observation.component", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                {"path": "Observation.component.referenceRange", "min": 0, "max": "*", "nameReference": "referenceRange"}
            ]}
        }));

        let definitions = parse_structure_definitions("test", &source).unwrap();
        let component = definitions.iter().find(|d| d.name == "Observation.component").unwrap();
        assert_eq!(
            component.field("referenceRange").unwrap().structure_path(),
            "Observation.referenceRange"
        );
    }

    #[rstest]
    #[case(json!({"path": "Observation.component.referenceRange", "contentReference": "#Observation.missing"}), "not a backbone")]
    #[case(json!({"path": "Observation.component.referenceRange", "nameReference": "missing"}), "unknown name 'missing'")]
    #[case(json!({"path": "Observation.component.referenceRange", "min": 0, "max": "1"}), "declares no type")]
    fn test_unresolvable_elements_are_rejected(#[case] element: serde_json::Value, #[case] expected: &str) {
        let source = bundle(json!({
            "resourceType": "StructureDefinition",
            "name": "Observation",
            "kind": "resource",
            "snapshot": {"element": [
                {"path": "Observation", "min": 0, "max": "*"},
                {"path": "Observation.component", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                element
            ]}
        }));
        let err = parse_structure_definitions("test", &source).unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");
    }

    #[rstest]
    #[case::primitive(json!({"name": "boolean", "kind": "primitive-type"}))]
    #[case::dstu2_primitive(json!({"name": "boolean", "kind": "datatype"}))]
    #[case::constraint(json!({"name": "SimpleQuantity", "kind": "complex-type", "derivation": "constraint"}))]
    #[case::dstu2_constraint(json!({"name": "SimpleQuantity", "kind": "datatype", "constrainedType": "Quantity"}))]
    #[case::abstract_base(json!({"name": "DomainResource", "kind": "resource", "abstract": true}))]
    #[case::logical(json!({"name": "Definition", "kind": "logical"}))]
    fn test_non_base_definitions_are_skipped(#[case] mut resource: serde_json::Value) {
        resource["resourceType"] = json!("StructureDefinition");
        // Constraint snapshots are rooted at the base type's path
        resource["snapshot"] = json!({"element": [
            {"path": "Quantity", "min": 0, "max": "*"},
            {"path": "Quantity.value", "min": 0, "max": "1", "type": [{"_code": {}}]}
        ]});
        assert!(parse_structure_definitions("test", &bundle(resource)).unwrap().is_empty());
    }

    #[test]
    fn test_type_refs_without_code_are_ignored() {
        let source = bundle(json!({
            "resourceType": "StructureDefinition",
            "name": "Extension",
            "kind": "complex-type",
            "snapshot": {"element": [
                {"path": "Extension", "min": 0, "max": "*"},
                {"path": "Extension.url", "min": 1, "max": "1",
                 "type": [{"_code": {"extension": []}}, {"code": "http://hl7.org/fhirpath/System.String"}]}
            ]}
        }));
        let definitions = parse_structure_definitions("test", &source).unwrap();
        let url = definitions[0].field("url").unwrap();
        assert_eq!(url.types.len(), 1);
        assert_eq!(url.types[0].kind(), TypeKind::String);
    }

    #[test]
    fn test_non_structure_definitions_are_skipped() {
        let source = bundle(json!({"resourceType": "SearchParameter", "name": "x"}));
        assert!(parse_structure_definitions("test", &source).unwrap().is_empty());
    }

    #[test]
    fn test_orphan_element_is_rejected() {
        let source = bundle(json!({
            "resourceType": "StructureDefinition",
            "name": "Condition",
            "kind": "resource",
            "snapshot": {"element": [
                {"path": "Condition.stage.summary", "min": 0, "max": "1", "type": [{"code": "CodeableConcept"}]}
            ]}
        }));
        let err = parse_structure_definitions("test", &source).unwrap_err();
        assert!(err.to_string().contains("before its parent"));
    }

    #[test]
    fn test_invalid_json_is_reported_with_source() {
        let err = parse_structure_definitions("profiles-types.json", "{").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { ref source_name, .. } if source_name == "profiles-types.json"));
    }
}
