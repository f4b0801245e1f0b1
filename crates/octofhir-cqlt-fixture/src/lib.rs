//! YAML fixture expansion for CQL tests
//!
//! This crate provides:
//! - Shorthand decoders for codes, quantities, names, periods and references
//! - `ResourceExpander`, which turns one fact record into a schema-valid
//!   FHIR resource for a given schema version
//! - `FixtureExpander`, which turns a whole test-case document into a
//!   `TestCase` with a patient-first `Bundle` and its expectations
//!
//! # Example
//!
//! ```
//! use octofhir_cqlt_diagnostics::NullSink;
//! use octofhir_cqlt_fixture::{FactRecord, expand_resource};
//! use octofhir_cqlt_schema::SchemaVersion;
//!
//! let fact = FactRecord::new("Observation")
//!     .with("code", "LOINC#8480-6 Systolic blood pressure")
//!     .with("valueQuantity", "120 mm[Hg]");
//! let resource = expand_resource(fact, Some("p1"), &SchemaVersion::fhir_v401(), &NullSink).unwrap();
//!
//! assert_eq!(resource.get("status").unwrap(), "final");
//! assert_eq!(resource.get("subject").unwrap()["reference"], "Patient/p1");
//! ```

pub mod bundle;
pub mod error;
pub mod expander;
pub mod resource;
pub mod shorthand;
pub mod test_case;

pub use bundle::*;
pub use error::*;
pub use expander::*;
pub use resource::*;
pub use test_case::*;
