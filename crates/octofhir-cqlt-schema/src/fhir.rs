//! Embedded FHIR schemas
//!
//! Structure definitions and configuration overlays for DSTU2, STU3 and R4,
//! compiled into the crate.

use crate::version::SchemaVersion;

macro_rules! resource {
    ($dir:literal, $file:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/", $dir, "/", $file))
    };
}

/// The three source documents describing one schema version
#[derive(Debug, Clone, Copy)]
pub struct SchemaSources {
    pub resources: &'static str,
    pub types: &'static str,
    pub config: &'static str,
}

pub const FHIR_DSTU2: SchemaSources = SchemaSources {
    resources: resource!("fhir-1.0.2", "profiles-resources.json"),
    types: resource!("fhir-1.0.2", "profiles-types.json"),
    config: resource!("fhir-1.0.2", "config.yaml"),
};

pub const FHIR_STU3: SchemaSources = SchemaSources {
    resources: resource!("fhir-3.0.0", "profiles-resources.json"),
    types: resource!("fhir-3.0.0", "profiles-types.json"),
    config: resource!("fhir-3.0.0", "config.yaml"),
};

pub const FHIR_R4: SchemaSources = SchemaSources {
    resources: resource!("fhir-4.0.1", "profiles-resources.json"),
    types: resource!("fhir-4.0.1", "profiles-types.json"),
    config: resource!("fhir-4.0.1", "config.yaml"),
};

/// Embedded sources for a version tag, if the tag is known
pub fn embedded_sources(version: &SchemaVersion) -> Option<SchemaSources> {
    match version.as_str() {
        SchemaVersion::FHIR_V102 => Some(FHIR_DSTU2),
        SchemaVersion::FHIR_V300 => Some(FHIR_STU3),
        SchemaVersion::FHIR_V400 | SchemaVersion::FHIR_V401 => Some(FHIR_R4),
        _ => None,
    }
}
