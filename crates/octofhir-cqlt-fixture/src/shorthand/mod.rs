//! Shorthand decoders
//!
//! Test authors write compact strings in place of structured FHIR values:
//!
//! | Type | Shorthand | Expands to |
//! |---|---|---|
//! | CodeableConcept | `SNOMED#38341003 Hypertension` | `{coding: [{system, code, display}], text}` |
//! | Coding | `LOINC#8480-6` | `{system, code}` |
//! | Quantity | `25 mg` | `{value: 25.0, unit: "mg"}` |
//! | HumanName | `John Q Public` | `{given: [John, Q], family: Public}` |
//! | Period | `2020-01-01 - 2020-02-01` | `{start, end}` |
//! | Reference | `Practitioner/123` | `{reference}` |
//!
//! Every decoder is a pure function of the raw value and a `ShorthandContext`.
//! Malformed input fails with a `ShorthandError` naming the raw string.

mod code_system;
mod coded;
mod name;
mod primitive;
mod quantity;
mod temporal;

pub use code_system::*;
pub use coded::*;
pub use name::*;
pub use primitive::*;
pub use quantity::*;
pub use temporal::*;

use crate::error::ShorthandError;
use octofhir_cqlt_diagnostics::DiagnosticSink;
use octofhir_cqlt_schema::{RawValue, SchemaRegistry, SchemaVersion, TypeKind};
use serde_json::{Value, json};

/// Version-dependent settings shared by all decoders
#[derive(Clone, Copy)]
pub struct ShorthandContext<'a> {
    pub version: &'a SchemaVersion,
    pub sink: &'a dyn DiagnosticSink,
    /// Whether `HumanName.family` repeats (DSTU2)
    pub family_is_list: bool,
}

impl<'a> ShorthandContext<'a> {
    pub fn new(version: &'a SchemaVersion, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            version,
            sink,
            family_is_list: false,
        }
    }

    /// Derive version-dependent settings from a loaded schema
    pub fn from_registry(registry: &'a SchemaRegistry, sink: &'a dyn DiagnosticSink) -> Self {
        let family_is_list = registry
            .find_type_definition("HumanName")
            .and_then(|name| name.field("family"))
            .is_some_and(|family| family.cardinality.is_many());
        Self {
            version: registry.version(),
            sink,
            family_is_list,
        }
    }

    pub fn with_family_list(mut self, family_is_list: bool) -> Self {
        self.family_is_list = family_is_list;
        self
    }
}

/// Decode a non-structured value for a field of the given type
pub fn decode(
    kind: TypeKind,
    type_code: &str,
    raw: &RawValue,
    ctx: &ShorthandContext<'_>,
) -> Result<Value, ShorthandError> {
    match kind {
        TypeKind::Boolean => decode_boolean(raw),
        TypeKind::Integer => decode_integer(raw),
        TypeKind::Decimal => decode_decimal(raw),
        TypeKind::String => decode_string(raw),
        TypeKind::Date => decode_date(raw),
        TypeKind::DateTime => decode_datetime(raw),
        TypeKind::Time => decode_time(raw),
        TypeKind::CodeableConcept => decode_codeable_concept(&text(raw, type_code)?, ctx),
        TypeKind::Coding => decode_coding(&text(raw, type_code)?, ctx),
        TypeKind::Quantity => decode_quantity(raw),
        TypeKind::HumanName => Ok(decode_human_name(&text(raw, type_code)?, ctx)),
        TypeKind::Period => decode_period(raw),
        TypeKind::Reference => Ok(decode_reference(&text(raw, type_code)?)),
        TypeKind::Backbone | TypeKind::Complex => Err(ShorthandError::NoShorthand {
            raw: raw_text(raw),
            type_code: type_code.to_string(),
        }),
    }
}

/// `{reference: "Patient/<id>"}`
pub fn patient_reference(patient_id: &str) -> Value {
    json!({ "reference": format!("Patient/{patient_id}") })
}

/// A plain reference string (`Practitioner/123`) as a `Reference`
pub fn decode_reference(raw: &str) -> Value {
    json!({ "reference": raw.trim() })
}

/// Rendering of a raw value for error messages
pub(crate) fn raw_text(raw: &RawValue) -> String {
    raw.to_scalar_string()
        .unwrap_or_else(|| raw.to_json().to_string())
}

fn text(raw: &RawValue, type_code: &str) -> Result<String, ShorthandError> {
    raw.to_scalar_string().ok_or_else(|| ShorthandError::NoShorthand {
        raw: raw_text(raw),
        type_code: type_code.to_string(),
    })
}
