//! Async boundaries to the CQL engine and the terminology service

use crate::error::{ExecutorError, ValueSetError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use octofhir_cqlt_assert::{CqlCode, CqlValue};
use octofhir_cqlt_fixture::Bundle;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// The CQL library under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Directories searched for the library and its includes
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

impl LibraryRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            paths: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Everything an executor needs to evaluate one test case
#[derive(Clone)]
pub struct ExecutionRequest<'a> {
    pub library: &'a LibraryRef,
    pub bundle: &'a Bundle,
    /// Evaluation "now"; the executor's clock when absent
    pub execution_date: Option<DateTime<FixedOffset>>,
    pub value_sets: Arc<dyn ValueSetResolver>,
}

/// Evaluates a CQL library against one patient bundle
#[async_trait]
pub trait CqlExecutor: Send + Sync {
    /// Returns each top-level expression's value keyed by expression name
    async fn execute(
        &self,
        request: ExecutionRequest<'_>,
    ) -> Result<IndexMap<String, CqlValue>, ExecutorError>;
}

/// One member of a value-set expansion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueSetCode {
    pub code: String,
    pub system: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
}

impl ValueSetCode {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            system: system.into(),
            version: None,
            display: None,
        }
    }
}

impl From<ValueSetCode> for CqlCode {
    fn from(code: ValueSetCode) -> Self {
        CqlCode {
            code: code.code,
            system: code.system,
            version: code.version,
            display: code.display,
        }
    }
}

/// Expands value sets referenced by the library under test
#[async_trait]
pub trait ValueSetResolver: Send + Sync {
    async fn expand(
        &self,
        id: &str,
        version: Option<&str>,
    ) -> Result<Vec<ValueSetCode>, ValueSetError>;
}

/// Value sets held in memory, keyed by id and optional version
///
/// A lookup with a version falls back to the unversioned entry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryValueSets {
    sets: Arc<RwLock<HashMap<(String, Option<String>), Vec<ValueSetCode>>>>,
}

impl InMemoryValueSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        id: impl Into<String>,
        version: Option<&str>,
        codes: impl IntoIterator<Item = ValueSetCode>,
    ) {
        self.sets.write().insert(
            (id.into(), version.map(str::to_string)),
            codes.into_iter().collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.sets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.read().is_empty()
    }

    fn lookup(&self, id: &str, version: Option<&str>) -> Option<Vec<ValueSetCode>> {
        let sets = self.sets.read();
        sets.get(&(id.to_string(), version.map(str::to_string)))
            .or_else(|| sets.get(&(id.to_string(), None)))
            .cloned()
    }
}

#[async_trait]
impl ValueSetResolver for InMemoryValueSets {
    async fn expand(
        &self,
        id: &str,
        version: Option<&str>,
    ) -> Result<Vec<ValueSetCode>, ValueSetError> {
        self.lookup(id, version).ok_or_else(|| ValueSetError::NotFound {
            id: id.to_string(),
            version: version.map(str::to_string),
        })
    }
}
