//! FHIR resource schema registry
//!
//! This crate provides:
//! - `SchemaVersion` tags selecting one snapshot of FHIR definitions
//! - Indexed resource, complex-type and backbone definitions built from
//!   FHIR `StructureDefinition` bundles
//! - The per-resource configuration overlay (patient field, defaults, aliases)
//! - `RawValue`, the value type of hand-authored fixture data
//! - Embedded DSTU2, STU3 and R4 schemas, loaded once per process
//! - Registries built from published FHIR packages (`hl7.fhir.r4.core`)

pub mod config;
pub mod definition;
pub mod error;
pub mod fhir;
pub mod loader;
pub mod package;
pub mod registry;
pub mod value;
pub mod version;

pub use config::*;
pub use definition::*;
pub use error::*;
pub use registry::*;
pub use value::*;
pub use version::*;
