//! Test suites: directories of YAML test-case documents
//!
//! Every `*.yaml` / `*.yml` file under the suite directory may hold several
//! `---`-separated documents, each one test case. A document may list
//! `externalData` files (relative to the suite directory) whose fact
//! records are appended after its own `data`.

use crate::error::{HarnessError, HarnessResult};
use octofhir_cqlt_diagnostics::DiagnosticSink;
use octofhir_cqlt_fixture::{ExpansionError, FixtureExpander, TestCase, TestCaseDocument};
use octofhir_cqlt_schema::{RawValue, SchemaRegistry, SchemaVersion};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const YAML_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// The expanded test cases of one suite directory, in file-name order
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub root: PathBuf,
    pub version: SchemaVersion,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    /// Walk `root` and expand every test-case document it holds against
    /// the embedded schema for `version`
    pub fn load_dir(
        root: impl AsRef<Path>,
        version: &SchemaVersion,
        sink: &dyn DiagnosticSink,
    ) -> HarnessResult<Self> {
        Self::load_dir_with(root, SchemaRegistry::load(version)?, sink)
    }

    /// Like `load_dir`, against a caller-supplied schema
    pub fn load_dir_with(
        root: impl AsRef<Path>,
        registry: Arc<SchemaRegistry>,
        sink: &dyn DiagnosticSink,
    ) -> HarnessResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(HarnessError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "test directory not found"),
            ));
        }

        let version = registry.version().clone();
        let expander = FixtureExpander::new(registry, sink);
        let mut cases = Vec::new();
        for path in discover_yaml_files(root)? {
            cases.extend(load_file(&expander, &path, root)?);
        }

        log::debug!("loaded {} test cases from {}", cases.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            version,
            cases,
        })
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Whether any case is marked `only`
    pub fn is_focused(&self) -> bool {
        self.cases.iter().any(|case| case.only)
    }
}

/// Every YAML file under `root`, sorted by path. External data files are
/// discovered too; they are told apart by holding a list, not a mapping.
fn discover_yaml_files(root: &Path) -> HarnessResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            HarnessError::io(&path, std::io::Error::other(e))
        })?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| YAML_EXTENSIONS.iter().any(|y| ext.eq_ignore_ascii_case(y)));
        if entry.file_type().is_file() && is_yaml {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Expand every test-case document in one file
pub fn load_file(
    expander: &FixtureExpander<'_>,
    path: &Path,
    suite_root: &Path,
) -> HarnessResult<Vec<TestCase>> {
    let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    let source_name = path.display().to_string();

    let mut cases = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&text) {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| HarnessError::expansion(path, ExpansionError::document(&source_name, e)))?;
        // Empty documents and external data lists are not test cases
        if !value.is_mapping() {
            continue;
        }

        let mut document: TestCaseDocument = serde_yaml::from_value(value)
            .map_err(|e| HarnessError::expansion(path, ExpansionError::document(&source_name, e)))?;
        for external in std::mem::take(&mut document.external_data) {
            document.append_data(load_external_data(&suite_root.join(external))?);
        }

        let case = expander
            .expand(document)
            .map_err(|e| HarnessError::expansion(path, e))?;
        cases.push(case);
    }
    Ok(cases)
}

/// A YAML file holding a list of fact records
fn load_external_data(path: &Path) -> HarnessResult<Vec<RawValue>> {
    let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    serde_yaml::from_str(&text).map_err(|e| {
        HarnessError::expansion(path, ExpansionError::document(path.display().to_string(), e))
    })
}
