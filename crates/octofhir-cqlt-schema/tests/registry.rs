//! Schema registry integration tests
//!
//! Covers the embedded schemas for every supported version and loading
//! custom schemas from disk.

use octofhir_cqlt_schema::*;
use rstest::rstest;

// === Embedded schema consistency ===

#[rstest]
#[case(SchemaVersion::fhir_v102())]
#[case(SchemaVersion::fhir_v300())]
#[case(SchemaVersion::fhir_v400())]
#[case(SchemaVersion::fhir_v401())]
fn test_config_fields_resolve_for_every_version(#[case] version: SchemaVersion) {
    let registry = SchemaRegistry::load(&version).unwrap();

    for resource_type in registry.resource_types() {
        let Some(config) = registry.find_resource_config(resource_type) else {
            continue;
        };
        let definition = registry.find_resource_definition(resource_type).unwrap();

        for field in config.defaults.keys() {
            assert!(
                registry.find_field_definition(definition, field).is_ok(),
                "{version}: default {resource_type}.{field} has no definition"
            );
        }
        for canonical in config.aliases.values() {
            assert!(
                registry.find_field_definition(definition, canonical).is_ok(),
                "{version}: alias target {resource_type}.{canonical} has no definition"
            );
        }
        if let Some(patient) = &config.patient {
            assert!(registry.find_field_definition(definition, patient).is_ok());
        }
    }
}

#[rstest]
#[case(SchemaVersion::fhir_v102())]
#[case(SchemaVersion::fhir_v300())]
#[case(SchemaVersion::fhir_v401())]
fn test_every_resource_has_unique_field_paths(#[case] version: SchemaVersion) {
    let registry = SchemaRegistry::load(&version).unwrap();
    for resource_type in registry.resource_types() {
        let definition = registry.find_resource_definition(resource_type).unwrap();
        let mut paths: Vec<_> = definition.fields().iter().map(|f| f.path.as_str()).collect();
        let total = paths.len();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), total, "{version}: duplicate path on {resource_type}");
    }
}

#[rstest]
#[case(SchemaVersion::fhir_v102(), "Quantity")]
#[case(SchemaVersion::fhir_v300(), "Age")]
#[case(SchemaVersion::fhir_v401(), "Age")]
fn test_condition_onset_choices(#[case] version: SchemaVersion, #[case] age_type: &str) {
    let registry = SchemaRegistry::load(&version).unwrap();
    let condition = registry.find_resource_definition("Condition").unwrap();

    let onset = registry
        .find_field_definition(condition, &format!("onset{age_type}"))
        .unwrap();
    assert_eq!(onset.field.name, "onset[x]");
    assert!(registry.find_field_definition(condition, "onsetDateTime").is_ok());
    assert!(registry.find_field_definition(condition, "onsetBoolean").is_err());
}

// === Published definitions ===

const BASE_ELEMENTS: &[&str] = &[
    "id",
    "meta",
    "implicitRules",
    "language",
    "text",
    "contained",
    "extension",
    "modifierExtension",
];

fn assert_structures_resolve(registry: &SchemaRegistry, definition: &ResourceDefinition) {
    for field in definition.fields() {
        if !field.types.iter().any(|t| t.kind() == TypeKind::Backbone) {
            continue;
        }
        let structure = registry
            .find_type_definition(field.structure_path())
            .unwrap_or_else(|| panic!("{} has no structure at {}", field.path, field.structure_path()));
        if field.content_reference.is_none() {
            assert_structures_resolve(registry, structure);
        }
    }
}

#[rstest]
#[case(SchemaVersion::fhir_v102())]
#[case(SchemaVersion::fhir_v300())]
#[case(SchemaVersion::fhir_v401())]
fn test_every_resource_type_loads(#[case] version: SchemaVersion) {
    let registry = SchemaRegistry::load(&version).unwrap();
    let resource_types: Vec<_> = registry.resource_types().collect();
    assert!(resource_types.len() >= 35, "{version}: only {} resources", resource_types.len());

    for resource_type in resource_types {
        let definition = registry.require_resource_definition(resource_type).unwrap();
        for element in BASE_ELEMENTS {
            assert!(
                definition.field(element).is_some(),
                "{version}: {resource_type} lacks {element}"
            );
        }
        assert_structures_resolve(&registry, definition);
    }
}

#[rstest]
#[case(SchemaVersion::fhir_v102(), &["DiagnosticReport", "DiagnosticOrder", "ProcedureRequest", "MedicationOrder", "MedicationAdministration", "MedicationDispense", "Goal", "Device", "Coverage", "Communication"])]
#[case(SchemaVersion::fhir_v300(), &["DiagnosticReport", "ProcedureRequest", "ReferralRequest", "MedicationAdministration", "MedicationDispense", "Goal", "Device", "Coverage", "Communication", "CareTeam"])]
#[case(SchemaVersion::fhir_v401(), &["DiagnosticReport", "ServiceRequest", "MedicationAdministration", "MedicationDispense", "Goal", "Device", "Coverage", "Communication", "CareTeam", "Task"])]
fn test_clinical_resources_are_embedded(#[case] version: SchemaVersion, #[case] expected: &[&str]) {
    let registry = SchemaRegistry::load(&version).unwrap();
    for resource_type in expected {
        assert!(
            registry.find_resource_definition(resource_type).is_some(),
            "{version}: {resource_type} is missing"
        );
    }
}

#[rstest]
#[case(SchemaVersion::fhir_v102())]
#[case(SchemaVersion::fhir_v300())]
#[case(SchemaVersion::fhir_v401())]
fn test_complex_types_carry_extensions(#[case] version: SchemaVersion) {
    let registry = SchemaRegistry::load(&version).unwrap();
    for type_name in ["Meta", "Narrative", "Extension", "Address", "ContactPoint", "Attachment", "Timing"] {
        let definition = registry
            .find_type_definition(type_name)
            .unwrap_or_else(|| panic!("{version}: {type_name} is missing"));
        assert!(definition.field("extension").is_some(), "{version}: {type_name}.extension");
    }

    let patient = registry.find_resource_definition("Patient").unwrap();
    let address = registry.find_field_definition(patient, "address").unwrap();
    assert_eq!(address.field.types[0].code(), "Address");
    assert!(address.field.cardinality.is_many());

    let encounter = registry.find_resource_definition("Encounter").unwrap();
    let hospitalization = registry.find_field_definition(encounter, "hospitalization").unwrap();
    let structure = registry
        .find_type_definition(hospitalization.field.structure_path())
        .unwrap();
    assert!(structure.field("dischargeDisposition").is_some());
}

#[rstest]
#[case(SchemaVersion::fhir_v102())]
#[case(SchemaVersion::fhir_v300())]
#[case(SchemaVersion::fhir_v401())]
fn test_component_reference_range_reuses_backbone(#[case] version: SchemaVersion) {
    let registry = SchemaRegistry::load(&version).unwrap();
    let component = registry.find_type_definition("Observation.component").unwrap();
    let range = component.field("referenceRange").unwrap();

    assert_eq!(range.content_reference.as_deref(), Some("Observation.referenceRange"));
    assert_eq!(range.structure_path(), "Observation.referenceRange");
    let structure = registry.find_type_definition(range.structure_path()).unwrap();
    assert!(structure.field("low").is_some());
}

#[test]
fn test_abstract_and_constrained_definitions_are_skipped() {
    let registry = SchemaRegistry::load(&SchemaVersion::fhir_v401()).unwrap();
    assert!(registry.find_resource_definition("Resource").is_none());
    assert!(registry.find_resource_definition("DomainResource").is_none());
    for type_name in ["SimpleQuantity", "boolean", "Element"] {
        assert!(registry.find_type_definition(type_name).is_none(), "{type_name}");
    }
}

// === Loading from disk ===

const RESOURCES: &str = r#"{
  "resourceType": "Bundle",
  "entry": [{"resource": {
    "resourceType": "StructureDefinition",
    "name": "Flag",
    "kind": "resource",
    "snapshot": {"element": [
      {"path": "Flag", "min": 0, "max": "*"},
      {"path": "Flag.id", "min": 0, "max": "1", "type": [{"code": "id"}]},
      {"path": "Flag.status", "min": 1, "max": "1", "type": [{"code": "code"}]},
      {"path": "Flag.subject", "min": 1, "max": "1", "type": [{"code": "Reference"}]},
      {"path": "Flag.author", "min": 0, "max": "0", "type": [{"code": "Reference"}]}
    ]}
  }}]
}"#;

const TYPES: &str = r#"{"resourceType": "Bundle", "entry": []}"#;

#[test]
fn test_from_dir_loads_custom_schema() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(RESOURCES_FILE), RESOURCES).unwrap();
    std::fs::write(dir.path().join(TYPES_FILE), TYPES).unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        "Flag:\n  patient: subject\n  defaults:\n    status: active\n",
    )
    .unwrap();

    let registry = SchemaRegistry::from_dir(SchemaVersion::new("custom"), dir.path()).unwrap();
    let flag = registry.find_resource_definition("Flag").unwrap();
    assert!(flag.field("author").unwrap().cardinality.is_forbidden());
    assert_eq!(
        registry.find_resource_config("Flag").and_then(|c| c.patient.as_deref()),
        Some("subject")
    );
}

#[test]
fn test_from_dir_without_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(RESOURCES_FILE), RESOURCES).unwrap();
    std::fs::write(dir.path().join(TYPES_FILE), TYPES).unwrap();

    let registry = SchemaRegistry::from_dir(SchemaVersion::new("custom"), dir.path()).unwrap();
    assert!(registry.find_resource_config("Flag").is_none());
}

#[test]
fn test_from_dir_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let err = SchemaRegistry::from_dir(SchemaVersion::new("FHIRv500"), dir.path()).unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedSchemaVersion { version } if version == "FHIRv500"));
}

// === Consistency check ===

#[rstest]
#[case("Flag:\n  defaults:\n    colour: red\n", "default field 'colour'")]
#[case("Flag:\n  aliases:\n    state: stat\n", "alias 'state' target field 'stat'")]
#[case("Flag:\n  patient: status\n", "is not a Reference")]
#[case("Flag:\n  defaults:\n    status:\n      $if-present: period\n      $then: inactive\n      $else: active\n", "condition field 'period'")]
#[case("Banner:\n  patient: subject\n", "no resource definition")]
fn test_inconsistent_config_is_rejected(#[case] config: &str, #[case] expected: &str) {
    let err = SchemaRegistry::from_sources(SchemaVersion::new("custom"), RESOURCES, TYPES, config)
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidConfig { .. }));
    assert!(err.to_string().contains(expected), "{err}");
}
