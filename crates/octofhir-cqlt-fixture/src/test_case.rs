//! Test-case documents and the fixture expander
//!
//! A test-case document is one YAML document:
//!
//! ```yaml
//! name: Hypertensive adult
//! data:
//!   - resourceType: Patient
//!     name: John Smith
//!     birthDate: 1970-01-01
//!   - resourceType: Condition
//!     code: SNOMED#38341003 Hypertension
//!     onset: 2010-03-01
//! results:
//!   InPopulation: true
//!   Conditions: $should have length 1
//! ```

use crate::bundle::Bundle;
use crate::error::{ExpansionError, ExpansionResult};
use crate::expander::ResourceExpander;
use crate::resource::FactRecord;
use indexmap::IndexMap;
use octofhir_cqlt_diagnostics::{
    ContextSink, DiagnosticSink, W_ADDITIONAL_PATIENT, W_MISSING_PATIENT, W_MISSING_RESULTS,
};
use octofhir_cqlt_schema::{RawValue, SchemaRegistry, SchemaVersion};
use serde::Deserialize;
use std::sync::Arc;

/// Expression name -> expected value or `$should ...` directive
pub type ExpectationMap = IndexMap<String, serde_json::Value>;

/// A test-case document as authored
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub only: bool,
    #[serde(default)]
    pub data: Option<Vec<RawValue>>,
    #[serde(default)]
    pub results: Option<ExpectationMap>,
    /// Files holding further fact records, relative to the document
    #[serde(default)]
    pub external_data: Vec<String>,
}

impl TestCaseDocument {
    /// Parse a single YAML document
    pub fn from_yaml(source_name: &str, yaml: &str) -> ExpansionResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ExpansionError::document(source_name, e))
    }

    /// Append fact records after `data`
    pub fn append_data(&mut self, facts: impl IntoIterator<Item = RawValue>) {
        self.data.get_or_insert_with(Vec::new).extend(facts);
    }
}

/// One executable test
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    /// Absent for skipped cases
    pub bundle: Option<Bundle>,
    pub expectations: ExpectationMap,
    pub skip: bool,
    pub only: bool,
}

/// Turns test-case documents into `TestCase`s for one schema version
pub struct FixtureExpander<'a> {
    registry: Arc<SchemaRegistry>,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> FixtureExpander<'a> {
    pub fn new(registry: Arc<SchemaRegistry>, sink: &'a dyn DiagnosticSink) -> Self {
        Self { registry, sink }
    }

    pub fn load(version: &SchemaVersion, sink: &'a dyn DiagnosticSink) -> ExpansionResult<Self> {
        Ok(Self::new(SchemaRegistry::load(version)?, sink))
    }

    pub fn version(&self) -> &SchemaVersion {
        self.registry.version()
    }

    /// Parse and expand one YAML document
    pub fn expand_yaml(&self, source_name: &str, yaml: &str) -> ExpansionResult<TestCase> {
        self.expand(TestCaseDocument::from_yaml(source_name, yaml)?)
    }

    /// Expand a document into a test case. Any malformed fact invalidates
    /// the whole case.
    pub fn expand(&self, document: TestCaseDocument) -> ExpansionResult<TestCase> {
        let name = document
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ExpansionError::MissingTestName)?
            .to_string();

        if document.skip {
            return Ok(TestCase {
                name,
                bundle: None,
                expectations: ExpectationMap::new(),
                skip: true,
                only: document.only,
            });
        }

        let sink = ContextSink::new(self.sink, name.clone());
        let expander = ResourceExpander::new(Arc::clone(&self.registry), &sink);

        let mut facts = document
            .data
            .unwrap_or_default()
            .into_iter()
            .map(FactRecord::from_raw)
            .collect::<ExpansionResult<Vec<_>>>()?;
        let patient = if facts.first().is_some_and(FactRecord::is_patient) {
            facts.remove(0)
        } else {
            sink.warn(
                W_MISSING_PATIENT,
                "first data entry is not a Patient, synthesizing one".to_string(),
            );
            FactRecord::new("Patient")
        };

        let patient = expander.expand(patient, None)?;
        let patient_id = patient.id().to_string();
        let mut resources = Vec::with_capacity(facts.len());
        for fact in facts {
            // Only the first entry is the test patient
            let owner = if fact.is_patient() {
                sink.warn(
                    W_ADDITIONAL_PATIENT,
                    "Patient entry after the first is not the test patient".to_string(),
                );
                None
            } else {
                Some(patient_id.as_str())
            };
            resources.push(expander.expand(fact, owner)?);
        }

        let expectations = document.results.unwrap_or_else(|| {
            sink.warn(W_MISSING_RESULTS, "no results to check".to_string());
            ExpectationMap::new()
        });

        log::debug!("expanded test case '{}' with {} resources", name, resources.len() + 1);
        Ok(TestCase {
            name,
            bundle: Some(Bundle::new(patient, resources)),
            expectations,
            skip: false,
            only: document.only,
        })
    }
}
