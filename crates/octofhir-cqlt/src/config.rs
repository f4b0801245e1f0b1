//! Harness configuration (`cqlt.yaml`)
//!
//! ```yaml
//! library:
//!   name: Hypertension
//!   version: 1.0.0
//!   paths: [cql]
//! tests:
//!   path: tests
//! fhir: FHIRv401
//! fhirPackage: packages/hl7.fhir.r4.core-4.0.1.tgz
//! options:
//!   date: 2024-06-30T00:00:00Z
//! vsac:
//!   apikey: ...
//!   cacheDir: .vscache
//! ```
//!
//! Relative paths resolve against the directory holding the file.

use crate::error::{HarnessError, HarnessResult};
use crate::executor::LibraryRef;
use crate::suite::TestSuite;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use octofhir_cqlt_diagnostics::DiagnosticSink;
use octofhir_cqlt_schema::{SchemaRegistry, SchemaVersion};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default configuration file name
pub const CONFIG_FILE: &str = "cqlt.yaml";

/// Overrides `vsac.apikey`
pub const VSAC_API_KEY_ENV: &str = "VSAC_API_KEY";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    pub library: LibraryRef,
    #[serde(default)]
    pub tests: TestsConfig,
    #[serde(default)]
    pub fhir: SchemaVersion,
    /// Published definitions to use instead of the embedded ones
    #[serde(default)]
    pub fhir_package: Option<PathBuf>,
    #[serde(default)]
    pub options: ExecutionOptions,
    #[serde(default)]
    pub vsac: VsacConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestsConfig {
    pub path: PathBuf,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tests"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutionOptions {
    /// Execution date as `YYYY-MM-DD`, a local date-time, or RFC 3339
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsacConfig {
    #[serde(default)]
    pub apikey: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl HarnessConfig {
    /// Read a configuration file, applying the `VSAC_API_KEY` override
    pub fn from_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut config = Self::from_yaml(&yaml, base_dir)?;
        config.apply_api_key_override(std::env::var(VSAC_API_KEY_ENV).ok());
        log::debug!("loaded harness configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text; relative paths resolve against `base_dir`
    pub fn from_yaml(yaml: &str, base_dir: &Path) -> HarnessResult<Self> {
        let mut config: Self =
            serde_yaml::from_str(yaml).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        config.resolve_paths(base_dir);
        Ok(config)
    }

    /// A non-empty key replaces the configured one
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.vsac.apikey = Some(key);
        }
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.library.name.trim().is_empty() {
            return Err(HarnessError::Config("library.name must not be empty".into()));
        }
        if !SchemaVersion::supported().contains(&self.fhir) {
            return Err(HarnessError::Config(format!(
                "unsupported fhir version '{}'",
                self.fhir
            )));
        }
        self.execution_date().map(|_| ())
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };
        for path in &mut self.library.paths {
            resolve(path);
        }
        resolve(&mut self.tests.path);
        if let Some(package) = self.fhir_package.as_mut() {
            resolve(package);
        }
        if let Some(cache_dir) = self.vsac.cache_dir.as_mut() {
            resolve(cache_dir);
        }
    }

    /// The configured execution date, if any
    pub fn execution_date(&self) -> HarnessResult<Option<DateTime<FixedOffset>>> {
        self.options
            .date
            .as_deref()
            .map(|raw| {
                parse_execution_date(raw).ok_or_else(|| {
                    HarnessError::Config(format!("invalid options.date '{raw}'"))
                })
            })
            .transpose()
    }

    /// The schema for the configured version, read from `fhirPackage`
    /// when one is set
    pub fn schema(&self) -> HarnessResult<Arc<SchemaRegistry>> {
        Ok(match &self.fhir_package {
            Some(package) => Arc::new(SchemaRegistry::from_package(self.fhir.clone(), package)?),
            None => SchemaRegistry::load(&self.fhir)?,
        })
    }

    /// Load the configured test directory against the configured schema
    pub fn load_suite(&self, sink: &dyn DiagnosticSink) -> HarnessResult<TestSuite> {
        TestSuite::load_dir_with(&self.tests.path, self.schema()?, sink)
    }
}

/// Dates and zone-less date-times are taken as UTC
fn parse_execution_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_cqlt_schema::SchemaError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const MINIMAL: &str = "library:\n  name: Hypertension\n";

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::from_yaml(MINIMAL, Path::new("/project")).unwrap();
        assert_eq!(config.library, LibraryRef::new("Hypertension"));
        assert_eq!(config.fhir, SchemaVersion::fhir_v401());
        assert_eq!(config.tests.path, PathBuf::from("/project/tests"));
        assert_eq!(config.execution_date().unwrap(), None);
        assert_eq!(config.vsac, VsacConfig::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
library:
  name: Hypertension
  version: 1.0.0
  paths: [cql, /shared/cql]
tests:
  path: yaml
fhir: FHIRv300
fhirPackage: packages/hl7.fhir.r3.core-3.0.2.tgz
options:
  date: 2024-06-30T12:00:00-05:00
vsac:
  apikey: secret
  cacheDir: .vscache
"#;
        let config = HarnessConfig::from_yaml(yaml, Path::new("/project")).unwrap();
        assert_eq!(config.library.version.as_deref(), Some("1.0.0"));
        assert_eq!(
            config.library.paths,
            vec![PathBuf::from("/project/cql"), PathBuf::from("/shared/cql")]
        );
        assert_eq!(config.tests.path, PathBuf::from("/project/yaml"));
        assert_eq!(config.fhir, SchemaVersion::fhir_v300());
        assert_eq!(
            config.fhir_package,
            Some(PathBuf::from("/project/packages/hl7.fhir.r3.core-3.0.2.tgz"))
        );
        assert_eq!(config.vsac.apikey.as_deref(), Some("secret"));
        assert_eq!(config.vsac.cache_dir, Some(PathBuf::from("/project/.vscache")));
        assert_eq!(
            config.execution_date().unwrap().unwrap().to_rfc3339(),
            "2024-06-30T12:00:00-05:00"
        );
    }

    #[rstest]
    #[case("2024-06-30", "2024-06-30T00:00:00+00:00")]
    #[case("2024-06-30T08:15:00", "2024-06-30T08:15:00+00:00")]
    #[case("2024-06-30T08:15:00Z", "2024-06-30T08:15:00+00:00")]
    fn test_execution_date_forms(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(parse_execution_date(raw).unwrap().to_rfc3339(), expected);
    }

    #[rstest]
    #[case::bad_date("library:\n  name: L\noptions:\n  date: next tuesday\n", "options.date")]
    #[case::bad_version("library:\n  name: L\nfhir: FHIRv500\n", "FHIRv500")]
    #[case::empty_name("library:\n  name: ' '\n", "library.name")]
    #[case::no_library("tests:\n  path: t\n", "library")]
    fn test_invalid_config(#[case] yaml: &str, #[case] mentions: &str) {
        let err = HarnessConfig::from_yaml(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
        assert!(err.to_string().contains(mentions), "{err}");
    }

    #[test]
    fn test_schema_source() {
        let config = HarnessConfig::from_yaml(MINIMAL, Path::new("/project")).unwrap();
        assert_eq!(config.fhir_package, None);
        assert_eq!(config.schema().unwrap().version(), &SchemaVersion::fhir_v401());

        let yaml = format!("{MINIMAL}fhirPackage: missing.tgz\n");
        let config = HarnessConfig::from_yaml(&yaml, Path::new("/project")).unwrap();
        let err = config.schema().unwrap_err();
        assert!(matches!(err, HarnessError::Schema(SchemaError::Io(ref message)) if message.contains("missing.tgz")));
    }

    #[test]
    fn test_api_key_override() {
        let mut config = HarnessConfig::from_yaml(MINIMAL, Path::new(".")).unwrap();
        config.apply_api_key_override(Some(String::new()));
        assert_eq!(config.vsac.apikey, None);
        config.apply_api_key_override(Some("from-env".into()));
        assert_eq!(config.vsac.apikey.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_from_file_resolves_against_file_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, MINIMAL).unwrap();

        let config = HarnessConfig::from_file(&path).unwrap();
        assert_eq!(config.tests.path, dir.path().join("tests"));

        let missing = HarnessConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(missing, HarnessError::Io { .. }));
    }
}
