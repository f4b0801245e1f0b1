//! Schema registry
//!
//! One `SchemaRegistry` holds every definition and configuration overlay for
//! one schema version. Embedded versions are loaded through
//! `SchemaRegistry::load`, which builds each registry at most once per
//! process and hands out shared references afterwards.

use crate::config::{ResourceConfig, parse_config};
use crate::definition::{DefinitionKind, FieldMatch, ResourceDefinition, TypeKind};
use crate::error::{SchemaError, SchemaResult};
use crate::fhir::embedded_sources;
use crate::loader::parse_structure_definitions;
use crate::package::load_package_definitions;
use crate::version::SchemaVersion;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub const RESOURCES_FILE: &str = "profiles-resources.json";
pub const TYPES_FILE: &str = "profiles-types.json";
pub const CONFIG_FILE: &str = "config.yaml";

static REGISTRIES: Lazy<RwLock<HashMap<SchemaVersion, Arc<SchemaRegistry>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Indexed definitions and configuration for one schema version
#[derive(Debug)]
pub struct SchemaRegistry {
    version: SchemaVersion,
    resources: IndexMap<String, ResourceDefinition>,
    types: HashMap<String, ResourceDefinition>,
    configs: HashMap<String, ResourceConfig>,
}

impl SchemaRegistry {
    /// Load the embedded schema for a version, memoized for the process
    pub fn load(version: &SchemaVersion) -> SchemaResult<Arc<Self>> {
        if let Some(registry) = REGISTRIES.read().get(version) {
            return Ok(Arc::clone(registry));
        }

        let sources = embedded_sources(version).ok_or_else(|| SchemaError::UnsupportedSchemaVersion {
            version: version.to_string(),
        })?;
        let registry = Arc::new(Self::from_sources(
            version.clone(),
            sources.resources,
            sources.types,
            sources.config,
        )?);
        log::debug!(
            "loaded schema {} with {} resource types",
            version,
            registry.resources.len()
        );

        let mut cache = REGISTRIES.write();
        Ok(Arc::clone(cache.entry(version.clone()).or_insert(registry)))
    }

    /// Build a registry from source documents (not cached)
    pub fn from_sources(
        version: SchemaVersion,
        resources_json: &str,
        types_json: &str,
        config_yaml: &str,
    ) -> SchemaResult<Self> {
        let definitions = parse_structure_definitions(RESOURCES_FILE, resources_json)?
            .into_iter()
            .chain(parse_structure_definitions(TYPES_FILE, types_json)?);
        Self::from_definitions(version, definitions, config_yaml)
    }

    /// Build a registry from a published FHIR package, a `.tgz` or its
    /// extracted directory (not cached). The embedded configuration overlay
    /// for `version` applies when there is one.
    pub fn from_package(version: SchemaVersion, path: impl AsRef<Path>) -> SchemaResult<Self> {
        let definitions = load_package_definitions(path.as_ref())?;
        let config = embedded_sources(&version).map_or("", |sources| sources.config);
        Self::from_definitions(version, definitions, config)
    }

    fn from_definitions(
        version: SchemaVersion,
        definitions: impl IntoIterator<Item = ResourceDefinition>,
        config_yaml: &str,
    ) -> SchemaResult<Self> {
        let mut resources = IndexMap::new();
        let mut types = HashMap::new();
        for definition in definitions {
            match definition.kind {
                DefinitionKind::Resource => {
                    resources.insert(definition.name.clone(), definition);
                }
                DefinitionKind::ComplexType | DefinitionKind::Backbone => {
                    types.insert(definition.name.clone(), definition);
                }
            }
        }

        let configs = parse_config(CONFIG_FILE, config_yaml)?.into_iter().collect();
        let registry = Self {
            version,
            resources,
            types,
            configs,
        };
        registry.validate_configs()?;
        Ok(registry)
    }

    /// Build a registry from a directory holding the three source files
    /// (not cached). The configuration overlay is optional.
    pub fn from_dir(version: SchemaVersion, dir: impl AsRef<Path>) -> SchemaResult<Self> {
        let dir = dir.as_ref();
        let resources_path = dir.join(RESOURCES_FILE);
        if !resources_path.is_file() {
            return Err(SchemaError::UnsupportedSchemaVersion {
                version: version.to_string(),
            });
        }

        let read = |path: &Path| {
            std::fs::read_to_string(path)
                .map_err(|e| SchemaError::Io(format!("{}: {}", path.display(), e)))
        };
        let resources = read(&resources_path)?;
        let types = read(&dir.join(TYPES_FILE))?;
        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.is_file() {
            read(&config_path)?
        } else {
            String::new()
        };

        Self::from_sources(version, &resources, &types, &config)
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    /// Names of all resource types, in source order
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn find_resource_definition(&self, type_name: &str) -> Option<&ResourceDefinition> {
        self.resources.get(type_name)
    }

    /// Like `find_resource_definition`, failing with `UnsupportedResourceType`
    pub fn require_resource_definition(&self, type_name: &str) -> SchemaResult<&ResourceDefinition> {
        self.find_resource_definition(type_name)
            .ok_or_else(|| SchemaError::UnsupportedResourceType {
                resource_type: type_name.to_string(),
            })
    }

    /// Complex-type or backbone definition (`Quantity`, `Observation.component`)
    pub fn find_type_definition(&self, name: &str) -> Option<&ResourceDefinition> {
        self.types.get(name)
    }

    /// Absent configs are valid: no defaults or aliases apply
    pub fn find_resource_config(&self, type_name: &str) -> Option<&ResourceConfig> {
        self.configs.get(type_name)
    }

    pub fn find_field_definition<'a>(
        &'a self,
        definition: &'a ResourceDefinition,
        field_name: &str,
    ) -> SchemaResult<FieldMatch<'a>> {
        definition
            .resolve_field(field_name)
            .ok_or_else(|| SchemaError::unknown_field(&definition.name, field_name))
    }

    fn validate_configs(&self) -> SchemaResult<()> {
        for (resource_type, config) in &self.configs {
            let invalid = |message: String| SchemaError::InvalidConfig {
                resource_type: resource_type.clone(),
                message,
            };
            let definition = self
                .find_resource_definition(resource_type)
                .ok_or_else(|| invalid("no resource definition".to_string()))?;
            let check = |field: &str, role: &str| {
                self.find_field_definition(definition, field)
                    .map_err(|_| invalid(format!("{role} field '{field}' does not exist")))
            };

            if let Some(patient) = &config.patient {
                let matched = check(patient, "patient")?;
                if matched.value_type.kind() != TypeKind::Reference {
                    return Err(invalid(format!("patient field '{patient}' is not a Reference")));
                }
            }
            for (field, default) in &config.defaults {
                check(field, "default")?;
                if let Some(condition) = default.condition_field() {
                    check(condition, "condition")?;
                }
            }
            for (alias, canonical) in &config.aliases {
                check(canonical, &format!("alias '{alias}' target"))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cardinality, DefaultValue};

    #[test]
    fn test_load_is_memoized() {
        let first = SchemaRegistry::load(&SchemaVersion::fhir_v401()).unwrap();
        let second = SchemaRegistry::load(&SchemaVersion::fhir_v401()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.version(), &SchemaVersion::fhir_v401());
    }

    #[test]
    fn test_unsupported_version() {
        let err = SchemaRegistry::load(&SchemaVersion::new("FHIRv999")).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedSchemaVersion {
                version: "FHIRv999".to_string()
            }
        );
    }

    #[test]
    fn test_find_field_definition_with_choice() {
        let registry = SchemaRegistry::load(&SchemaVersion::fhir_v401()).unwrap();
        let observation = registry.find_resource_definition("Observation").unwrap();

        let matched = registry.find_field_definition(observation, "valueQuantity").unwrap();
        assert_eq!(matched.field.path, "Observation.value[x]");
        assert_eq!(matched.value_type.code(), "Quantity");

        let err = registry.find_field_definition(observation, "valueFoo").unwrap_err();
        assert_eq!(err, SchemaError::unknown_field("Observation", "valueFoo"));
    }

    #[test]
    fn test_version_dialects_differ() {
        let dstu2 = SchemaRegistry::load(&SchemaVersion::fhir_v102()).unwrap();
        let r4 = SchemaRegistry::load(&SchemaVersion::fhir_v401()).unwrap();

        let family = |registry: &SchemaRegistry| {
            registry
                .find_type_definition("HumanName")
                .and_then(|d| d.field("family"))
                .map(|f| f.cardinality)
        };
        assert_eq!(family(&dstu2), Some(Cardinality::Many));
        assert_eq!(family(&r4), Some(Cardinality::AtMostOne));

        assert_eq!(
            dstu2.find_resource_config("Condition").and_then(|c| c.patient.as_deref()),
            Some("patient")
        );
        assert_eq!(
            r4.find_resource_config("Condition").and_then(|c| c.patient.as_deref()),
            Some("subject")
        );
        assert!(dstu2.find_resource_definition("MedicationOrder").is_some());
        assert!(r4.find_resource_definition("MedicationOrder").is_none());
    }

    #[test]
    fn test_backbone_definitions_are_indexed() {
        let registry = SchemaRegistry::load(&SchemaVersion::fhir_v300()).unwrap();
        let component = registry.find_type_definition("Observation.component").unwrap();
        assert!(component.resolve_field("valueQuantity").is_some());
    }

    #[test]
    fn test_require_resource_definition() {
        let registry = SchemaRegistry::load(&SchemaVersion::fhir_v401()).unwrap();
        assert!(registry.require_resource_definition("Patient").is_ok());
        assert!(matches!(
            registry.require_resource_definition("Spaceship"),
            Err(SchemaError::UnsupportedResourceType { .. })
        ));
        assert!(registry.find_resource_config("Patient").is_none());
    }

    #[test]
    fn test_from_package_uses_embedded_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let tarball = crate::package::tests::write_tarball(dir.path());

        // The R4 overlay names resources this package lacks
        let err = SchemaRegistry::from_package(SchemaVersion::fhir_v401(), &tarball).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConfig { .. }));

        let registry = SchemaRegistry::from_package(SchemaVersion::new("observations"), &tarball).unwrap();
        let observation = registry.find_resource_definition("Observation").unwrap();
        assert!(registry.find_field_definition(observation, "status").is_ok());
        assert!(registry.find_resource_config("Observation").is_none());

        let component = registry.find_type_definition("Observation.component").unwrap();
        let range = registry.find_field_definition(component, "referenceRange").unwrap();
        assert!(registry.find_type_definition(range.field.structure_path()).is_some());
    }

    #[test]
    fn test_conditional_default_is_loaded() {
        let registry = SchemaRegistry::load(&SchemaVersion::fhir_v300()).unwrap();
        let config = registry.find_resource_config("Condition").unwrap();
        assert!(matches!(
            config.defaults.get("clinicalStatus"),
            Some(DefaultValue::Conditional { condition_field, .. }) if condition_field == "abatementDateTime"
        ));
    }
}
