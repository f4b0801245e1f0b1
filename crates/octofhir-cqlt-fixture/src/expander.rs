//! Resource expansion
//!
//! `ResourceExpander` turns one `FactRecord` into a schema-shaped
//! `ExpandedResource` for the registry's version:
//!
//! 1. alias names are replaced by their canonical field names
//! 2. configured defaults fill fields the record does not set
//! 3. `id` is taken from the record, the caller's patient id (for the
//!    patient itself) or a fresh UUID
//! 4. the configured patient field is pointed at the patient
//! 5. every other field is validated against its definition and decoded
//!    according to its declared type and cardinality
//!
//! Structured (mapping) values recurse into the definition of their type,
//! so an already expanded resource expands to itself.

use crate::error::{ExpansionError, ExpansionResult};
use crate::resource::{ExpandedResource, FactRecord, ID};
use crate::shorthand::{self, ShorthandContext};
use octofhir_cqlt_diagnostics::{DiagnosticSink, W_ALIAS_SHADOWED};
use octofhir_cqlt_schema::{
    Cardinality, FieldMatch, RawMap, RawValue, ResourceConfig, ResourceDefinition, SchemaRegistry,
    SchemaVersion, TypeKind,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Expand a single fact record against the embedded schema for `version`
pub fn expand_resource(
    fact: FactRecord,
    patient_id: Option<&str>,
    version: &SchemaVersion,
    sink: &dyn DiagnosticSink,
) -> ExpansionResult<ExpandedResource> {
    ResourceExpander::load(version, sink)?.expand(fact, patient_id)
}

/// Expands fact records for one schema version
pub struct ResourceExpander<'a> {
    registry: Arc<SchemaRegistry>,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> ResourceExpander<'a> {
    pub fn new(registry: Arc<SchemaRegistry>, sink: &'a dyn DiagnosticSink) -> Self {
        Self { registry, sink }
    }

    /// Use the memoized embedded schema for `version`
    pub fn load(version: &SchemaVersion, sink: &'a dyn DiagnosticSink) -> ExpansionResult<Self> {
        Ok(Self::new(SchemaRegistry::load(version)?, sink))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn version(&self) -> &SchemaVersion {
        self.registry.version()
    }

    /// Expand one fact record; `patient_id` is threaded into the configured
    /// patient field
    pub fn expand(&self, fact: FactRecord, patient_id: Option<&str>) -> ExpansionResult<ExpandedResource> {
        let registry: &SchemaRegistry = &self.registry;
        let definition = registry.require_resource_definition(&fact.resource_type)?;
        let config = registry.find_resource_config(&fact.resource_type);
        let ctx = ShorthandContext::from_registry(registry, self.sink);
        let is_patient = fact.is_patient();

        let mut fields = fact.fields;
        if let Some(config) = config {
            fields = self.resolve_aliases(&fact.resource_type, config, fields);
            apply_defaults(config, &mut fields);
        }

        let id = match fields.shift_remove(ID) {
            Some(raw) if !raw.is_null() => raw.to_scalar_string().ok_or_else(|| {
                ExpansionError::invalid_fact(format!("{ID} must be a scalar, found {}", raw.kind_name()))
            })?,
            _ => match patient_id {
                Some(patient_id) if is_patient => patient_id.to_string(),
                _ => Uuid::new_v4().to_string(),
            },
        };
        log::trace!("expanding {}/{} ({} fields)", fact.resource_type, id, fields.len());

        let mut resource = ExpandedResource::new(&fact.resource_type, id);
        let patient_field = config.and_then(|c| c.patient.as_deref());
        if let (Some(field), Some(patient_id)) = (patient_field, patient_id) {
            if !fields.contains_key(field) {
                let matched = registry.find_field_definition(definition, field)?;
                let reference = shorthand::patient_reference(patient_id);
                let reference = match matched.field.cardinality {
                    Cardinality::Many => Value::Array(vec![reference]),
                    _ => reference,
                };
                resource.insert(field.to_string(), reference);
            }
        }

        for (name, raw) in &fields {
            if raw.is_null() {
                continue;
            }
            let value = self.expand_field(definition, name, raw, &ctx)?;
            resource.insert(name.clone(), value);
        }
        Ok(resource)
    }

    /// Replace alias keys by canonical names; a canonical name supplied
    /// alongside its alias wins
    fn resolve_aliases(&self, resource_type: &str, config: &ResourceConfig, fields: RawMap) -> RawMap {
        if config.aliases.is_empty() {
            return fields;
        }
        let shadowed: Vec<String> = fields
            .keys()
            .filter(|name| {
                let canonical = config.canonical_name(name);
                canonical != name.as_str() && fields.contains_key(canonical)
            })
            .cloned()
            .collect();

        let mut resolved = RawMap::with_capacity(fields.len());
        for (name, value) in fields {
            let canonical = config.canonical_name(&name);
            if shadowed.contains(&name) {
                self.sink.warn(
                    W_ALIAS_SHADOWED,
                    format!("{resource_type}: '{name}' ignored because '{canonical}' is also set"),
                );
                continue;
            }
            resolved.insert(canonical.to_string(), value);
        }
        resolved
    }

    fn expand_field(
        &self,
        owner: &ResourceDefinition,
        name: &str,
        raw: &RawValue,
        ctx: &ShorthandContext<'_>,
    ) -> ExpansionResult<Value> {
        let matched = self.registry.find_field_definition(owner, name)?;
        match matched.field.cardinality {
            Cardinality::Forbidden => Err(ExpansionError::ZeroCardinalityField {
                owner: owner.name.clone(),
                field: name.to_string(),
            }),
            Cardinality::Many => {
                let items: Vec<&RawValue> = match raw {
                    RawValue::List(items) => items.iter().filter(|item| !item.is_null()).collect(),
                    single => vec![single],
                };
                items
                    .into_iter()
                    .map(|item| self.expand_value(owner, name, matched, item, ctx))
                    .collect::<ExpansionResult<Vec<_>>>()
                    .map(Value::Array)
            }
            Cardinality::ExactlyOne | Cardinality::AtMostOne => match raw {
                RawValue::List(_) => Err(ExpansionError::MultipleValuesNotAllowed {
                    owner: owner.name.clone(),
                    field: name.to_string(),
                }),
                single => self.expand_value(owner, name, matched, single, ctx),
            },
        }
    }

    fn expand_value(
        &self,
        owner: &ResourceDefinition,
        name: &str,
        matched: FieldMatch<'_>,
        raw: &RawValue,
        ctx: &ShorthandContext<'_>,
    ) -> ExpansionResult<Value> {
        let kind = matched.value_type.kind();
        if let RawValue::Map(map) = raw {
            let structure = match kind {
                TypeKind::Backbone => Some(matched.field.structure_path()),
                _ => matched.value_type.definition_name(),
            };
            if let Some(type_name) = structure {
                return match self.registry.find_type_definition(type_name) {
                    Some(sub) => self.expand_structure(sub, map, ctx),
                    None => {
                        log::debug!("no definition for {type_name}, keeping {}.{name} as written", owner.name);
                        Ok(raw.to_json())
                    }
                };
            }
        }

        shorthand::decode(kind, matched.value_type.code(), raw, ctx).map_err(|source| {
            ExpansionError::Shorthand {
                owner: owner.name.clone(),
                field: name.to_string(),
                source,
            }
        })
    }

    fn expand_structure(
        &self,
        definition: &ResourceDefinition,
        map: &RawMap,
        ctx: &ShorthandContext<'_>,
    ) -> ExpansionResult<Value> {
        let mut object = Map::new();
        for (name, raw) in map {
            if raw.is_null() {
                continue;
            }
            object.insert(name.clone(), self.expand_field(definition, name, raw, ctx)?);
        }
        Ok(Value::Object(object))
    }
}

/// Fill unset fields from configured defaults; conditions are judged
/// against the record as authored
fn apply_defaults(config: &ResourceConfig, fields: &mut RawMap) {
    let authored: &RawMap = fields;
    let pending: Vec<(String, RawValue)> = config
        .defaults
        .iter()
        .filter(|(field, _)| !authored.contains_key(field.as_str()))
        .map(|(field, default)| (field.clone(), default.resolve(authored).clone()))
        .collect();
    fields.extend(pending);
}
