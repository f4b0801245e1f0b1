//! Code system aliases
//!
//! The `SYSTEM` part of a coded shorthand is looked up case-insensitively.
//! Unknown names pass through unchanged; a warning is reported unless the
//! name already looks like a URI.

use super::ShorthandContext;
use octofhir_cqlt_diagnostics::W_UNKNOWN_CODE_SYSTEM;
use octofhir_cqlt_schema::SchemaVersion;

const CODE_SYSTEMS: &[(&str, &str)] = &[
    ("SNOMED", "http://snomed.info/sct"),
    ("LOINC", "http://loinc.org"),
    ("RXNORM", "http://www.nlm.nih.gov/research/umls/rxnorm"),
    ("RXN", "http://www.nlm.nih.gov/research/umls/rxnorm"),
    ("RX", "http://www.nlm.nih.gov/research/umls/rxnorm"),
    ("UCUM", "http://unitsofmeasure.org"),
    ("CPT", "http://www.ama-assn.org/go/cpt"),
    ("CVX", "http://hl7.org/fhir/sid/cvx"),
    ("ICD-10", "http://hl7.org/fhir/sid/icd-10"),
    ("ICD-10-CM", "http://hl7.org/fhir/sid/icd-10-cm"),
    ("ICD-9", "http://hl7.org/fhir/sid/icd-9-cm"),
];

/// Added with the R4 terminology server layout
const R4_CODE_SYSTEMS: &[(&str, &str)] = &[
    ("ICD-10-PCS", "http://www.cms.gov/Medicare/Coding/ICD10"),
    ("ICD-9-D", "http://hl7.org/fhir/sid/icd-9-cm/diagnosis"),
    ("ICD-9-P", "http://hl7.org/fhir/sid/icd-9-cm/procedure"),
    ("V3-ROLE-CODE", "http://terminology.hl7.org/CodeSystem/v3-RoleCode"),
    ("V3-RACE", "urn:oid:2.16.840.1.113883.6.238"),
    ("V3-ETHNICITY", "urn:oid:2.16.840.1.113883.6.238"),
];

const OBSERVATION_CATEGORY: &str = "OBS-CAT";
const OBSERVATION_CATEGORY_R4: &str = "http://terminology.hl7.org/CodeSystem/observation-category";
const OBSERVATION_CATEGORY_LEGACY: &str = "http://hl7.org/fhir/observation-category";

/// System URI for a known alias at the given version
pub fn lookup_code_system(alias: &str, version: &SchemaVersion) -> Option<&'static str> {
    let upper = alias.to_ascii_uppercase();
    if upper == OBSERVATION_CATEGORY {
        return Some(if version.is_r4() {
            OBSERVATION_CATEGORY_R4
        } else {
            OBSERVATION_CATEGORY_LEGACY
        });
    }

    let find = |table: &[(&str, &'static str)]| {
        table
            .iter()
            .find(|(name, _)| *name == upper)
            .map(|(_, uri)| *uri)
    };
    find(CODE_SYSTEMS).or_else(|| version.is_r4().then(|| find(R4_CODE_SYSTEMS)).flatten())
}

/// Resolve an alias to a system URI, passing unknown systems through
pub fn resolve_code_system(system: &str, ctx: &ShorthandContext<'_>) -> String {
    if let Some(uri) = lookup_code_system(system, ctx.version) {
        return uri.to_string();
    }
    if !looks_like_uri(system) {
        ctx.sink.warn(
            W_UNKNOWN_CODE_SYSTEM,
            format!("Unknown code system '{system}' for {}, using it as-is", ctx.version),
        );
    }
    system.to_string()
}

fn looks_like_uri(system: &str) -> bool {
    system.starts_with("urn:") || system.contains("://")
}
